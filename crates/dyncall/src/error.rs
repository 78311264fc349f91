// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly this many arguments.
    Exactly(usize),

    /// This many arguments or more; the surplus fills the variadic tail.
    AtLeast(usize),
}

impl Arity {
    /// Whether `count` arguments satisfy this arity.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(expected) => count == expected,
            Self::AtLeast(minimum) => count >= minimum,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(expected) => write!(f, "exactly {expected}"),
            Self::AtLeast(minimum) => write!(f, "at least {minimum}"),
        }
    }
}

/// Misuse of the call adapter detected while wrapping, binding or invoking.
///
/// The adapter raises or returns these wrapped in a [`rescue::Error`] of kind
/// [`Native`](rescue::ErrorKind::Native); use [`rescue::Error::find_source`] to get them back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CallError {
    /// The value to wrap was absent or nil.
    #[error("call target is nil")]
    NilTarget,

    /// The value to wrap was not a [`Func`](crate::Func).
    #[error("value of type {found} is not callable")]
    NotCallable {
        /// The type of the value that was supplied instead.
        found: &'static str,
    },

    /// The number of bound arguments does not fit the signature.
    #[error("{signature} takes {expected} arguments, got {actual}")]
    ArgCount {
        /// The rendered signature of the target.
        signature: String,
        /// What the signature accepts.
        expected: Arity,
        /// How many arguments were bound.
        actual: usize,
    },

    /// An argument does not have the declared parameter type.
    #[error("argument {index} must be {expected}, got {found}")]
    ArgType {
        /// Position of the argument.
        index: usize,
        /// The declared parameter type.
        expected: &'static str,
        /// The type of the supplied value.
        found: &'static str,
    },

    /// The continuation does not take as many parameters as the target returns values.
    #[error("continuation {continuation} takes {actual} arguments, but the call returns {expected} values")]
    ContinuationArity {
        /// The rendered signature of the continuation.
        continuation: String,
        /// How many values the target returns.
        expected: usize,
        /// How many parameters the continuation takes.
        actual: usize,
    },

    /// The continuation's first parameter is not the target's first return type.
    #[error("continuation {continuation} takes {found} first, but the call returns {expected} first")]
    ContinuationType {
        /// The rendered signature of the continuation.
        continuation: String,
        /// The target's first return type.
        expected: &'static str,
        /// The continuation's first parameter type.
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_accepts() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeast(1).accepts(1));
        assert!(Arity::AtLeast(1).accepts(4));
        assert!(!Arity::AtLeast(1).accepts(0));
    }

    #[test]
    fn arg_count_message() {
        let error = CallError::ArgCount {
            signature: "fn(i32, ...u8)".to_owned(),
            expected: Arity::AtLeast(1),
            actual: 0,
        };

        insta::assert_snapshot!(error.to_string(), @"fn(i32, ...u8) takes at least 1 arguments, got 0");
    }
}
