// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId, type_name};
use std::fmt;

/// A type that can travel inside a [`Value`].
///
/// Implemented for every `'static` type that is `Clone + Debug + Send + Sync`.
pub trait Arg: Any + Clone + fmt::Debug + Send + Sync {}

impl<T> Arg for T where T: Any + Clone + fmt::Debug + Send + Sync {}

trait DynArg: Send + Sync {
    fn clone_box(&self) -> Box<dyn DynArg>;
    fn value_type_id(&self) -> TypeId;
    fn value_type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Arg> DynArg for T {
    fn clone_box(&self) -> Box<dyn DynArg> {
        Box::new(self.clone())
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

enum Repr {
    Absent,
    Nil(&'static str),
    Present(Box<dyn DynArg>),
}

/// A dynamically typed argument or return value.
///
/// A value is in one of three states:
///
/// - present: it holds a value of some [`Arg`] type;
/// - nil: it stands for a missing reference, such as `None`, and remembers the type it was
///   meant to have;
/// - absent: the slot was never filled. This is the [`Default`].
///
/// When arguments are bound, nil and absent values are both replaced by the zero value of the
/// declared parameter type.
///
/// # Examples
///
/// ```rust
/// use dyncall::Value;
///
/// let value = Value::new(42_u32);
/// assert_eq!(value.downcast_ref::<u32>(), Some(&42));
///
/// assert!(Value::of_option(None::<String>).is_nil());
/// assert!(Value::default().is_absent());
/// ```
pub struct Value {
    repr: Repr,
}

impl Value {
    /// Wraps a value.
    ///
    /// Wrapping a `Value` returns it unchanged instead of nesting it.
    #[must_use]
    pub fn new<T: Arg>(value: T) -> Self {
        let mut slot = Some(value);

        if let Some(inner) = (&mut slot as &mut dyn Any).downcast_mut::<Option<Self>>() {
            return inner.take().unwrap_or_default();
        }

        match slot {
            Some(value) => Self {
                repr: Repr::Present(Box::new(value)),
            },
            None => Self::absent(),
        }
    }

    /// A slot that was never filled.
    #[must_use]
    pub fn absent() -> Self {
        Self { repr: Repr::Absent }
    }

    /// A missing reference meant to be of type `T`.
    #[must_use]
    pub fn nil<T: Any>() -> Self {
        Self {
            repr: Repr::Nil(type_name::<T>()),
        }
    }

    /// A present value for `Some`, a nil value of type `T` for `None`.
    #[must_use]
    pub fn of_option<T: Arg>(value: Option<T>) -> Self {
        value.map_or_else(Self::nil::<T>, Self::new)
    }

    /// Whether the slot was never filled.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self.repr, Repr::Absent)
    }

    /// Whether this is a missing reference.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self.repr, Repr::Nil(_))
    }

    /// Whether this holds an actual value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self.repr, Repr::Present(_))
    }

    /// The name of the held type, the intended type of a nil value, or `"absent"`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match &self.repr {
            Repr::Absent => "absent",
            Repr::Nil(type_name) => type_name,
            Repr::Present(value) => value.value_type_name(),
        }
    }

    /// Whether this holds a value of type `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        match &self.repr {
            Repr::Present(value) => value.value_type_id() == TypeId::of::<T>(),
            Repr::Absent | Repr::Nil(_) => false,
        }
    }

    /// A reference to the held value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.repr {
            Repr::Present(value) => value.as_any().downcast_ref(),
            Repr::Absent | Repr::Nil(_) => None,
        }
    }

    /// Moves the held value out if it has type `T`.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when it does not hold a `T`.
    pub fn take<T: Any>(self) -> Result<T, Self> {
        match self.repr {
            Repr::Present(value) if value.value_type_id() == TypeId::of::<T>() => match value.into_any().downcast::<T>() {
                Ok(value) => Ok(*value),
                // The type id was checked above.
                Err(_) => Err(Self::absent()),
            },
            repr => Err(Self { repr }),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::absent()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Absent => Repr::Absent,
            Repr::Nil(type_name) => Repr::Nil(type_name),
            Repr::Present(value) => Repr::Present(value.clone_box()),
        };

        Self { repr }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Absent => f.write_str("<absent>"),
            Repr::Nil(type_name) => write!(f, "<nil {type_name}>"),
            Repr::Present(value) => value.debug(f),
        }
    }
}

/// Builds a `Vec<Value>` from a list of expressions, wrapping each with [`Value::new`].
///
/// # Examples
///
/// ```rust
/// use dyncall::{Value, args};
///
/// let values = args![3_i32, "abc".to_owned(), Value::absent()];
///
/// assert_eq!(values.len(), 3);
/// assert!(values[2].is_absent());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::new($value)),+]
    };
}
