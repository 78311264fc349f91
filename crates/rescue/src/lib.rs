// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Fault classification and recovery points for panic-based error propagation.
//!
//! # Why
//!
//! Some code paths report failure by raising instead of returning: assertion helpers, deeply
//! nested callbacks, or functions invoked through a dynamic adapter that cannot thread a
//! `Result` back. This crate gives such code one vocabulary: whatever is raised becomes a
//! [`Fault`], every fault is classified into the uniform [`Error`], and a [`RecoveryPoint`]
//! decides what happens with it.
//!
//! # Core Types
//!
//! - [`Fault`]: A raised value sorted into a uniform error, a native error or an unknown value.
//! - [`Error`]: The uniform, cheaply cloneable error every fault is classified into.
//! - [`RecoveryPoint`]: A boundary that intercepts faults and dispatches them to a handler,
//!   an error slot, or process termination.
//! - [`Break`]: The stop sentinel raised by [`stop`] to end a loop successfully.
//!
//! # Examples
//!
//! ## Raising and Catching
//!
//! ```rust
//! use rescue::{Error, ErrorKind, catch, raise};
//!
//! fn parse_port(text: &str) -> u16 {
//!     match text.parse() {
//!         Ok(port) => port,
//!         Err(err) => raise(Error::caused_by(err)),
//!     }
//! }
//!
//! assert_eq!(catch(|| parse_port("8080")).unwrap(), 8080);
//!
//! let error = catch(|| parse_port("eighty")).unwrap_err();
//! assert_eq!(error.kind(), ErrorKind::Native);
//! ```
//!
//! ## Handler Attribution
//!
//! A handler recovery point attributes the error to the function that defined the handler:
//!
//! ```rust
//! use rescue::{Error, RecoveryPoint, raise};
//!
//! fn settle() -> Option<String> {
//!     let mut caller = None;
//!     RecoveryPoint::handler(|err| caller = err.caller().map(str::to_owned))
//!         .run(|| raise(Error::new("card declined")));
//!     caller
//! }
//!
//! assert!(settle().unwrap().ends_with("settle"));
//! ```
//!
//! # Features
//!
//! - `logs` (default): emits `tracing` events when faults are recovered or are fatal.

mod error;
mod fault;
pub mod flow;
mod options;
mod recovery;
mod stop;

pub use error::{Error, ErrorKind, Source};
pub use fault::{Fault, UnknownType, classify, raise, raise_any, recover};
pub use options::RecoveryOptions;
pub use recovery::{RecoveryPoint, catch, fatal, function_name, function_name_of, handle};
pub use stop::{Break, stop};
