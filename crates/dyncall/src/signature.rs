// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::{Arg, Arity, Value};

/// A type that can be a parameter of a wrapped callable.
///
/// Parameters need a zero value ([`Default`]) that replaces absent and nil arguments.
pub trait Param: Arg + Default {}

impl<T> Param for T where T: Arg + Default {}

/// Identity of a parameter or return type.
///
/// Two `TypeInfo` compare equal when they describe the same type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    zero: Option<fn() -> Value>,
}

impl TypeInfo {
    /// Describes `T`, without a zero value.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            zero: None,
        }
    }

    /// Describes the parameter type `T`, including its zero value.
    #[must_use]
    pub fn param<T: Param>() -> Self {
        Self {
            zero: Some(zero_of::<T>),
            ..Self::of::<T>()
        }
    }

    /// The type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A fresh zero value, if this describes a parameter type.
    #[must_use]
    pub fn zero(&self) -> Option<Value> {
        self.zero.map(|zero| zero())
    }

    /// Whether this describes `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

fn zero_of<T: Param>() -> Value {
    Value::new(T::default())
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The shape of a wrapped callable: its parameter types, its variadic element type if any, and
/// its return types.
///
/// A variadic callable's last parameter is `Vec<T>`; it counts as one parameter in
/// [`num_in`](Self::num_in), and [`variadic_elem`](Self::variadic_elem) describes `T`.
///
/// Displayed like a function pointer type, with the variadic tail as `...T`.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<TypeInfo>,
    variadic: Option<TypeInfo>,
    returns: Vec<TypeInfo>,
}

impl Signature {
    pub(crate) fn new(params: Vec<TypeInfo>, variadic: Option<TypeInfo>, returns: Vec<TypeInfo>) -> Self {
        debug_assert!(variadic.is_none() || !params.is_empty(), "variadic signature without a tail parameter");

        Self { params, variadic, returns }
    }

    /// Number of declared parameters, counting the variadic tail as one.
    #[must_use]
    pub fn num_in(&self) -> usize {
        self.params.len()
    }

    /// Number of declared return values.
    #[must_use]
    pub fn num_out(&self) -> usize {
        self.returns.len()
    }

    /// Whether the last parameter is a variadic tail.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// The declared parameter types.
    #[must_use]
    pub fn params(&self) -> &[TypeInfo] {
        &self.params
    }

    /// The element type of the variadic tail.
    #[must_use]
    pub fn variadic_elem(&self) -> Option<&TypeInfo> {
        self.variadic.as_ref()
    }

    /// The declared return types.
    #[must_use]
    pub fn returns(&self) -> &[TypeInfo] {
        &self.returns
    }

    /// How many arguments can be bound.
    #[must_use]
    pub fn arity(&self) -> Arity {
        if self.is_variadic() {
            Arity::AtLeast(self.fixed_count())
        } else {
            Arity::Exactly(self.params.len())
        }
    }

    /// Whether `count` arguments can be bound.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        self.arity().accepts(count)
    }

    /// The type of the argument bound at `index`: a declared parameter, or for positions in the
    /// variadic tail, the element type.
    #[must_use]
    pub fn arg_type(&self, index: usize) -> Option<&TypeInfo> {
        match &self.variadic {
            Some(element) if index >= self.fixed_count() => Some(element),
            _ => self.params.get(index),
        }
    }

    /// The zero value of the argument bound at `index`.
    #[must_use]
    pub fn zero_at(&self, index: usize) -> Option<Value> {
        self.arg_type(index).and_then(TypeInfo::zero)
    }

    fn fixed_count(&self) -> usize {
        if self.is_variadic() {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fn(")?;

        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }

            match &self.variadic {
                Some(element) if index == self.fixed_count() => write!(f, "...{element}")?,
                _ => write!(f, "{param}")?,
            }
        }

        f.write_str(")")?;

        match self.returns.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {single}"),
            returns => {
                f.write_str(" -> (")?;
                for (index, ret) in returns.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ret}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}
