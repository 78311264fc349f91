// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Curried dynamic invocation of callables with argument normalization and fault capture.
//!
//! # Why
//!
//! Event dispatchers, plugin hosts and similar glue often receive "some function" and "some
//! arguments" from different places, and a third place decides what to do with the results.
//! This crate erases a closure or function into a [`Func`] with a runtime [`Signature`] and
//! calls it in three stages:
//!
//! 1. [`wrap`] picks the callable and returns a [`Binder`].
//! 2. [`Binder::bind`] checks the argument count and replaces absent or nil arguments with the
//!    zero value of their parameter type, returning a [`Bound`].
//! 3. [`Bound::invoke`] performs the call and passes the results to an optional continuation
//!    whose parameters must match the callable's returns.
//!
//! A wrapped callable returns `()` or a tuple of up to eight values (see [`Returns`]). A single
//! value is returned as a one-element tuple, like `|x: i32| (x * 2,)`.
//!
//! The last stage runs under a [`rescue`] recovery point: a fault raised by the callable or
//! the continuation, or a continuation mismatch, comes back as an `Err` and never unwinds
//! past the adapter.
//!
//! # Core Types
//!
//! - [`Value`]: A dynamically typed argument or return value, possibly absent or nil.
//! - [`Func`]: A type-erased callable with its [`Signature`].
//! - [`Binder`] and [`Bound`]: The first two call stages.
//! - [`ArgPool`]: A thread-safe free list of argument buffers reused across calls.
//! - [`CallError`]: Misuse detected by the adapter.
//!
//! # Examples
//!
//! ```rust
//! use dyncall::{Value, args, wrap};
//!
//! let greet = wrap(|name: String, times: usize| (name.repeat(times),));
//!
//! // An absent argument becomes the zero value of its parameter.
//! let bound = greet.bind(args!["ab".to_owned(), Value::absent()]);
//!
//! bound.then(|greeting: String| assert_eq!(greeting, "")).unwrap();
//! ```
//!
//! Continuation mismatches are reported, not called:
//!
//! ```rust
//! use dyncall::{CallError, args, wrap};
//!
//! let bound = wrap(|a: i32| (a, a)).bind(args![1]);
//!
//! let error = bound.then(|_: i32| ()).unwrap_err();
//! assert!(matches!(error.find_source::<CallError>(), Some(CallError::ContinuationArity { .. })));
//! ```
//!
//! # Features
//!
//! - `logs` (default): emits `tracing` events for failed invocations.

mod call;
mod callable;
mod error;
mod func;
mod pool;
mod signature;
mod value;

pub use call::{Binder, Bound, wrap, wrap_value, wrap_with_pool};
pub use callable::{Callable, Returns, Variadic, VariadicMarker, variadic};
pub use error::{Arity, CallError};
pub use func::Func;
pub use pool::{ArgPool, PoolOptions, PooledArgs};
pub use signature::{Param, Signature, TypeInfo};
pub use value::{Arg, Value};
