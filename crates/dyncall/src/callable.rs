// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::vec::Drain;

use rescue::function_name;

use crate::{Arg, CallError, Param, Signature, TypeInfo, Value};

/// The values returned by a wrapped callable.
///
/// Implemented for `()` and for tuples of up to eight [`Arg`] types. A callable returning a
/// single value returns a one-element tuple, like `(T,)`:
///
/// ```rust
/// use dyncall::wrap;
///
/// let binder = wrap(|x: i32| (x * 2,));
///
/// assert_eq!(binder.signature().num_out(), 1);
/// ```
///
/// A bare value is not a `Returns`:
///
/// ```compile_fail
/// use dyncall::wrap;
///
/// let binder = wrap(|x: i32| x * 2);
/// ```
pub trait Returns: Send + 'static {
    /// The declared return types, in order.
    fn types() -> Vec<TypeInfo>;

    /// Appends the returned values to `out`, in order.
    fn push_into(self, out: &mut Vec<Value>);
}

impl Returns for () {
    fn types() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn push_into(self, _out: &mut Vec<Value>) {}
}

macro_rules! impl_returns {
    ($($ty:ident $var:ident),+) => {
        impl<$($ty: Arg),+> Returns for ($($ty,)+) {
            fn types() -> Vec<TypeInfo> {
                vec![$(TypeInfo::of::<$ty>()),+]
            }

            fn push_into(self, out: &mut Vec<Value>) {
                let ($($var,)+) = self;
                $(out.push(Value::new($var));)+
            }
        }
    };
}

impl_returns!(A a);
impl_returns!(A a, B b);
impl_returns!(A a, B b, C c);
impl_returns!(A a, B b, C c, D d);
impl_returns!(A a, B b, C c, D d, E e);
impl_returns!(A a, B b, C c, D d, E e, F f);
impl_returns!(A a, B b, C c, D d, E e, F f, G g);
impl_returns!(A a, B b, C c, D d, E e, F f, G g, H h);

/// A function or closure the call adapter can wrap.
///
/// Implemented for every `Fn` of up to eight [`Param`] arguments that returns a [`Returns`]
/// value, and for [`variadic`] wrappers. The `Marker` parameter only tells the implementations
/// apart; callers never name it.
pub trait Callable<Marker>: Send + Sync + 'static {
    /// The declared shape of the callable.
    fn signature() -> Signature;

    /// The name of the function that defined the callable.
    fn name() -> &'static str {
        function_name::<Self>()
    }

    /// Calls the callable with `args`, which are consumed, and appends its return values to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::ArgType`] when an argument does not have the declared type. The
    /// callable is not called in that case.
    fn call(&self, args: &mut Vec<Value>, out: &mut Vec<Value>) -> Result<(), CallError>;
}

/// Reads arguments in declaration order, replacing absent and nil ones by zero values.
struct ArgReader<'a> {
    values: Drain<'a, Value>,
    index: usize,
}

impl<'a> ArgReader<'a> {
    fn new(args: &'a mut Vec<Value>) -> Self {
        Self {
            values: args.drain(..),
            index: 0,
        }
    }

    fn read<T: Param>(&mut self) -> Result<T, CallError> {
        let value = self.values.next().unwrap_or_default();
        convert(self.advance(), value)
    }

    fn read_rest<T: Param>(&mut self) -> Result<Vec<T>, CallError> {
        let mut rest = Vec::with_capacity(self.values.len());
        for value in self.values.by_ref() {
            let index = self.index;
            self.index += 1;
            rest.push(convert(index, value)?);
        }
        Ok(rest)
    }

    fn advance(&mut self) -> usize {
        let index = self.index;
        self.index += 1;
        index
    }
}

fn convert<T: Param>(index: usize, value: Value) -> Result<T, CallError> {
    match value.take::<T>() {
        Ok(value) => Ok(value),
        Err(value) if !value.is_present() => Ok(T::default()),
        Err(value) => Err(CallError::ArgType {
            index,
            expected: type_name::<T>(),
            found: value.type_name(),
        }),
    }
}

macro_rules! impl_callable {
    ($($ty:ident $var:ident),*) => {
        #[allow(unused_mut, unused_variables, clippy::many_single_char_names, reason = "macro untidiness")]
        #[expect(clippy::allow_attributes, reason = "macro untidiness")]
        impl<Func, Ret, $($ty,)*> Callable<fn($($ty,)*) -> Ret> for Func
        where
            Func: Fn($($ty),*) -> Ret + Send + Sync + 'static,
            Ret: Returns,
            $($ty: Param,)*
        {
            fn signature() -> Signature {
                Signature::new(vec![$(TypeInfo::param::<$ty>()),*], None, Ret::types())
            }

            fn call(&self, args: &mut Vec<Value>, out: &mut Vec<Value>) -> Result<(), CallError> {
                let mut reader = ArgReader::new(args);
                $(let $var = reader.read::<$ty>()?;)*
                drop(reader);

                (self)($($var),*).push_into(out);
                Ok(())
            }
        }

        #[allow(unused_mut, unused_variables, clippy::many_single_char_names, reason = "macro untidiness")]
        #[expect(clippy::allow_attributes, reason = "macro untidiness")]
        impl<Func, Ret, $($ty,)* Rest> Callable<(VariadicMarker, fn($($ty,)* Vec<Rest>) -> Ret)> for Variadic<Func>
        where
            Func: Fn($($ty,)* Vec<Rest>) -> Ret + Send + Sync + 'static,
            Ret: Returns,
            $($ty: Param,)*
            Rest: Param,
        {
            fn signature() -> Signature {
                Signature::new(
                    vec![$(TypeInfo::param::<$ty>(),)* TypeInfo::param::<Vec<Rest>>()],
                    Some(TypeInfo::param::<Rest>()),
                    Ret::types(),
                )
            }

            fn name() -> &'static str {
                function_name::<Func>()
            }

            fn call(&self, args: &mut Vec<Value>, out: &mut Vec<Value>) -> Result<(), CallError> {
                let mut reader = ArgReader::new(args);
                $(let $var = reader.read::<$ty>()?;)*
                let rest = reader.read_rest::<Rest>()?;
                drop(reader);

                (self.f)($($var,)* rest).push_into(out);
                Ok(())
            }
        }
    };
}

impl_callable!();
impl_callable!(A a);
impl_callable!(A a, B b);
impl_callable!(A a, B b, C c);
impl_callable!(A a, B b, C c, D d);
impl_callable!(A a, B b, C c, D d, E e);
impl_callable!(A a, B b, C c, D d, E e, F f);
impl_callable!(A a, B b, C c, D d, E e, F f, G g);
impl_callable!(A a, B b, C c, D d, E e, F f, G g, H h);

#[doc(hidden)]
#[derive(Debug)]
pub struct VariadicMarker;

/// A callable whose last parameter, a `Vec<T>`, collects every surplus argument.
///
/// Created by [`variadic`].
#[derive(Debug, Clone, Copy)]
pub struct Variadic<F> {
    f: F,
}

/// Marks `f`, whose last parameter is a `Vec<T>`, as variadic.
///
/// Binding then accepts any number of arguments beyond the fixed ones, each of type `T`.
///
/// # Examples
///
/// ```rust
/// use dyncall::{args, variadic, wrap};
///
/// let sum = wrap(variadic(|base: i32, rest: Vec<i32>| {
///     assert_eq!(base + rest.iter().sum::<i32>(), 10);
/// }));
///
/// sum.bind(args![1, 2, 3, 4]).call().unwrap();
/// sum.bind(args![10]).call().unwrap();
/// ```
#[must_use]
pub fn variadic<F>(f: F) -> Variadic<F> {
    Variadic { f }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape<M, F: Callable<M>>(_: &F) -> Signature {
        F::signature()
    }

    fn call<M, F: Callable<M>>(f: &F, mut args: Vec<Value>) -> Result<Vec<Value>, CallError> {
        let mut out = Vec::new();
        f.call(&mut args, &mut out)?;
        Ok(out)
    }

    #[test]
    fn closure_signature() {
        let f = |a: i32, b: String| (a, b.len());

        let sig = shape(&f);

        assert_eq!(sig.num_in(), 2);
        assert_eq!(sig.num_out(), 2);
        assert!(!sig.is_variadic());
    }

    #[test]
    fn variadic_signature() {
        let f = variadic(|_: u8, _: Vec<String>| ());

        let sig = shape(&f);

        assert_eq!(sig.num_in(), 2);
        assert_eq!(sig.num_out(), 0);
        assert!(sig.variadic_elem().unwrap().is::<String>());
    }

    #[test]
    fn returns_are_pushed_in_order() {
        let out = call(&|a: i32, b: i32| (b, a), crate::args![1, 2]).unwrap();

        assert_eq!(out[0].downcast_ref::<i32>(), Some(&2));
        assert_eq!(out[1].downcast_ref::<i32>(), Some(&1));
    }

    #[test]
    fn absent_and_nil_read_as_zero() {
        let out = call(&|a: u64, b: String| (a, b), vec![Value::absent(), Value::nil::<String>()]).unwrap();

        assert_eq!(out[0].downcast_ref::<u64>(), Some(&0));
        assert_eq!(out[1].downcast_ref::<String>(), Some(&String::new()));
    }

    #[test]
    fn wrong_type_is_rejected_before_calling() {
        let error = call(&|a: i32, b: i32| (a + b,), crate::args![1, "two"]).unwrap_err();

        assert_eq!(
            error,
            CallError::ArgType {
                index: 1,
                expected: "i32",
                found: "&str",
            }
        );
    }

    #[test]
    fn variadic_collects_surplus() {
        let out = call(&variadic(|first: u8, rest: Vec<u8>| (first, rest)), crate::args![1_u8, 2_u8, 3_u8]).unwrap();

        assert_eq!(out[0].downcast_ref::<u8>(), Some(&1));
        assert_eq!(out[1].downcast_ref::<Vec<u8>>(), Some(&vec![2, 3]));
    }

    #[test]
    fn eight_parameters() {
        let sum = |a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, g: u8, h: u8| (a + b + c + d + e + f + g + h,);

        let out = call(&sum, crate::args![1_u8, 1_u8, 1_u8, 1_u8, 1_u8, 1_u8, 1_u8, 1_u8]).unwrap();

        assert_eq!(shape(&sum).num_in(), 8);
        assert_eq!(out[0].downcast_ref::<u8>(), Some(&8));
    }

    #[test]
    fn names_defining_function() {
        fn named<M, F: Callable<M>>(_: &F) -> &'static str {
            F::name()
        }

        assert!(named(&|| ()).ends_with("callable::tests::names_defining_function"));
        assert!(named(&variadic(|_: Vec<u8>| ())).ends_with("callable::tests::names_defining_function"));
    }
}
