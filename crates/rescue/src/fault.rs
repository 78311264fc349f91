// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, type_name};
use std::error::Error as StdError;
use std::fmt;

use crate::{Error, ErrorKind, Source};

/// A value raised at a non-local exit, sorted into one of three shapes.
///
/// Faults travel as panic payloads. [`Fault::from_payload`] turns whatever a panic carried
/// into a `Fault`, and [`classify`] turns a `Fault` into the uniform [`Error`].
#[derive(Debug)]
pub enum Fault {
    /// The raised value already was a uniform [`Error`].
    Uniform(Error),

    /// The raised value was a native [`std::error::Error`].
    Native(Source),

    /// The raised value was anything else.
    UnknownType(UnknownType),
}

/// Describes a raised value that is neither an [`Error`] nor a native error.
///
/// This is the source of every [`ErrorKind::UnknownType`] error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type {type_name}: {description}")]
pub struct UnknownType {
    type_name: &'static str,
    description: String,
}

impl UnknownType {
    /// Creates a description of a raised value of the named type.
    #[must_use]
    pub fn new(type_name: &'static str, description: impl Into<String>) -> Self {
        Self {
            type_name,
            description: description.into(),
        }
    }

    /// The dynamic type of the raised value, as far as it could be determined.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// A rendering of the raised value.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Fault {
    /// Wraps a native error.
    #[must_use]
    pub fn native<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Native(Box::new(error))
    }

    /// Describes an arbitrary value by its type name and `Debug` rendering.
    #[must_use]
    pub fn unknown<T: Any + fmt::Debug>(value: &T) -> Self {
        Self::UnknownType(UnknownType::new(type_name::<T>(), format!("{value:?}")))
    }

    /// Sorts a panic payload into a fault.
    ///
    /// Payloads raised through [`raise`] come back unchanged. Boxed native errors become
    /// [`Fault::Native`]. The string payloads of `panic!` and every other value become
    /// [`Fault::UnknownType`]; strings keep their text as the description.
    ///
    /// A panic payload is a `Box<dyn Any>`, which does not record the name of its type. A
    /// value panicked with directly, like `std::panic::panic_any(io_error)`, is therefore
    /// described as an opaque payload of unknown type. Raise values with [`raise`] and
    /// [`Fault::native`] for native errors, or with [`raise_any`] for anything else, to keep
    /// their type in the classified error.
    #[must_use]
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Self>() {
            Ok(fault) => return *fault,
            Err(payload) => payload,
        };

        let payload = match payload.downcast::<Error>() {
            Ok(error) => return Self::Uniform(*error),
            Err(payload) => payload,
        };

        let payload = match payload.downcast::<Source>() {
            Ok(source) => return Self::Native(*source),
            Err(payload) => payload,
        };

        let payload = match payload.downcast::<String>() {
            Ok(message) => return Self::UnknownType(UnknownType::new(type_name::<String>(), *message)),
            Err(payload) => payload,
        };

        match payload.downcast::<&'static str>() {
            Ok(message) => Self::UnknownType(UnknownType::new(type_name::<&str>(), *message)),
            Err(_) => Self::UnknownType(UnknownType::new("unknown", "opaque panic payload")),
        }
    }
}

impl From<Error> for Fault {
    fn from(error: Error) -> Self {
        Self::Uniform(error)
    }
}

impl From<UnknownType> for Fault {
    fn from(unknown: UnknownType) -> Self {
        Self::UnknownType(unknown)
    }
}

/// Converts a fault into the uniform [`Error`].
///
/// Total and idempotent: a [`Fault::Uniform`] error is returned as the very same instance, a
/// native error that is itself an [`Error`] is unwrapped back to it, any other native error
/// becomes the source of an [`ErrorKind::Native`] error, and anything else becomes an
/// [`ErrorKind::UnknownType`] error.
///
/// # Examples
///
/// ```rust
/// use rescue::{Error, ErrorKind, Fault, classify};
///
/// let original = Error::new("boom");
/// let classified = classify(Fault::from(original.clone()));
/// assert!(classified.ptr_eq(&original));
///
/// let unknown = classify(Fault::unknown(&42_u8));
/// assert_eq!(unknown.kind(), ErrorKind::UnknownType);
/// assert_eq!(unknown.to_string(), "unknown type u8: 42");
/// ```
#[must_use]
pub fn classify(fault: Fault) -> Error {
    match fault {
        Fault::Uniform(error) => error,
        Fault::Native(source) => match source.downcast::<Error>() {
            Ok(error) => *error,
            Err(source) => Error::from_parts(ErrorKind::Native, "", Some(source)),
        },
        Fault::UnknownType(unknown) => Error::from_parts(ErrorKind::UnknownType, "", Some(Box::new(unknown))),
    }
}

/// Classifies the content of a recovery slot.
///
/// An empty slot means nothing was raised and yields `None`; callers must not dispatch to any
/// handler in that case.
#[must_use]
pub fn recover(payload: Option<Box<dyn Any + Send>>) -> Option<Error> {
    payload.map(|payload| classify(Fault::from_payload(payload)))
}

/// Raises a fault, unwinding to the nearest recovery point.
///
/// The unwind bypasses the panic hook, so raising prints nothing. A fault that reaches the
/// top of a thread without meeting a recovery point still ends the thread like a panic, only
/// without the panic message.
///
/// # Examples
///
/// ```rust
/// use rescue::{Error, catch, raise};
///
/// let result: Result<(), Error> = catch(|| raise(Error::new("gave up")));
/// assert_eq!(result.unwrap_err().to_string(), "gave up");
/// ```
pub fn raise(fault: impl Into<Fault>) -> ! {
    std::panic::resume_unwind(Box::new(fault.into()))
}

/// Raises an arbitrary value as an [`UnknownType`] fault, recording its type and `Debug` form.
pub fn raise_any<T: Any + fmt::Debug>(value: T) -> ! {
    raise(Fault::unknown(&value))
}
