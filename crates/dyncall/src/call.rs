// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use rescue::{Error, ErrorKind, catch, raise};

use crate::{ArgPool, CallError, Callable, Func, PooledArgs, Signature, Value};

/// Wraps `f` for dynamic invocation, drawing argument buffers from the global [`ArgPool`].
///
/// The returned [`Binder`] is the first of three stages: [`Binder::bind`] supplies the
/// arguments, and [`Bound::invoke`] performs the call and feeds its results to an optional
/// continuation.
///
/// `f` must return `()` or a tuple of up to eight values, see [`Returns`](crate::Returns). A
/// single value is returned as a one-element tuple: `|x: i32| (x * 2,)`, not `|x: i32| x * 2`.
///
/// # Examples
///
/// ```rust
/// use dyncall::{args, wrap};
///
/// wrap(|x: i32| (x * 2,))
///     .bind(args![21])
///     .then(|doubled: i32| assert_eq!(doubled, 42))
///     .unwrap();
/// ```
///
/// Several values and a continuation taking all of them:
///
/// ```rust
/// use dyncall::{args, wrap};
/// use rescue::Error;
///
/// let bound = wrap(|a: usize, b: String| (a + b.len(), None::<Error>)).bind(args![3_usize, "abc".to_owned()]);
///
/// bound
///     .then(|sum: usize, err: Option<Error>| {
///         assert_eq!(sum, 6);
///         assert!(err.is_none());
///     })
///     .unwrap();
/// ```
#[must_use]
pub fn wrap<F, M>(f: F) -> Binder
where
    F: Callable<M>,
    M: 'static,
{
    Binder::new(Func::new(f))
}

/// Like [`wrap`], drawing argument buffers from `pool`.
#[must_use]
pub fn wrap_with_pool<F, M>(f: F, pool: Arc<ArgPool>) -> Binder
where
    F: Callable<M>,
    M: 'static,
{
    Binder::with_pool(Func::new(f), pool)
}

/// Wraps a callable carried inside a [`Value`].
///
/// Raises a fault with [`CallError::NilTarget`] when `target` is absent or nil, and with
/// [`CallError::NotCallable`] when it holds anything but a [`Func`].
#[track_caller]
#[must_use]
pub fn wrap_value(target: Value) -> Binder {
    match target.take::<Func>() {
        Ok(func) => Binder::new(func),
        Err(target) if !target.is_present() => raise(Error::caused_by(CallError::NilTarget)),
        Err(target) => raise(Error::caused_by(CallError::NotCallable {
            found: target.type_name(),
        })),
    }
}

/// The first call stage: a callable waiting for its arguments.
#[derive(Debug, Clone)]
pub struct Binder {
    func: Func,
    pool: Arc<ArgPool>,
}

impl Binder {
    /// Creates a binder for `func` using the global [`ArgPool`].
    #[must_use]
    pub fn new(func: Func) -> Self {
        Self::with_pool(func, ArgPool::global())
    }

    /// Creates a binder for `func` using `pool`.
    #[must_use]
    pub fn with_pool(func: Func, pool: Arc<ArgPool>) -> Self {
        Self { func, pool }
    }

    /// The wrapped callable.
    #[must_use]
    pub fn func(&self) -> &Func {
        &self.func
    }

    /// The declared shape of the wrapped callable.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        self.func.signature()
    }

    /// Binds the positional arguments.
    ///
    /// Absent and nil arguments are replaced by the zero value of the parameter at their
    /// position, or of the variadic element type for positions in the variadic tail.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::ArgCount`] when the number of arguments does not fit the signature.
    pub fn try_bind<I>(&self, args: I) -> Result<Bound, CallError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut bound = self.pool.acquire();
        bound.extend(args);

        let signature = self.signature();
        if !signature.accepts(bound.len()) {
            return Err(CallError::ArgCount {
                signature: signature.to_string(),
                expected: signature.arity(),
                actual: bound.len(),
            });
        }

        for (index, arg) in bound.iter_mut().enumerate() {
            if arg.is_present() {
                continue;
            }

            if let Some(zero) = signature.zero_at(index) {
                *arg = zero;
            }
        }

        Ok(Bound {
            func: self.func.clone(),
            args: bound,
        })
    }

    /// Binds the positional arguments, see [`try_bind`](Self::try_bind).
    ///
    /// An argument count that does not fit the signature is a programmer error: it raises a
    /// fault carrying [`CallError::ArgCount`].
    #[track_caller]
    #[must_use]
    pub fn bind<I>(&self, args: I) -> Bound
    where
        I: IntoIterator<Item = Value>,
    {
        match self.try_bind(args) {
            Ok(bound) => bound,
            Err(err) => raise(Error::caused_by(err)),
        }
    }
}

/// The second call stage: a callable with normalized arguments, ready to be invoked.
///
/// A `Bound` can be invoked any number of times, with different continuations, without
/// binding again.
#[derive(Debug)]
pub struct Bound {
    func: Func,
    args: PooledArgs,
}

impl Bound {
    /// The wrapped callable.
    #[must_use]
    pub fn func(&self) -> &Func {
        &self.func
    }

    /// The normalized arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Calls the wrapped callable, then feeds its return values to `continuation`, if any.
    ///
    /// The continuation must take as many parameters as the callable returns values, and its
    /// first parameter must have the type of the first return value. On a mismatch the
    /// continuation is not called.
    ///
    /// # Errors
    ///
    /// Returns an error when the callable or the continuation raises a fault, when an argument
    /// does not have its declared type, or when the continuation does not match the returns.
    /// No fault escapes this method.
    pub fn invoke(&self, continuation: Option<&Func>) -> Result<(), Error> {
        let result = catch(|| self.call_through(continuation))
            .and_then(|result| result.map_err(Error::caused_by))
            .map_err(|err| self.describe_fault(err));

        if let Err(err) = &result {
            emit_failed(&self.func, err);
        }

        result
    }

    /// Calls the wrapped callable without a continuation.
    ///
    /// # Errors
    ///
    /// See [`invoke`](Self::invoke).
    pub fn call(&self) -> Result<(), Error> {
        self.invoke(None)
    }

    /// Calls the wrapped callable and feeds its return values to `continuation`.
    ///
    /// # Errors
    ///
    /// See [`invoke`](Self::invoke).
    pub fn then<C, M>(&self, continuation: C) -> Result<(), Error>
    where
        C: Callable<M>,
        M: 'static,
    {
        self.invoke(Some(&Func::new(continuation)))
    }

    /// Like [`invoke`](Self::invoke), with the continuation carried inside a [`Value`].
    ///
    /// An absent or nil value means no continuation.
    ///
    /// # Errors
    ///
    /// See [`invoke`](Self::invoke). A value that holds anything but a [`Func`] is rejected
    /// with [`CallError::NotCallable`] before the callable runs.
    pub fn invoke_value(&self, continuation: Value) -> Result<(), Error> {
        if !continuation.is_present() {
            return self.invoke(None);
        }

        match continuation.take::<Func>() {
            Ok(continuation) => self.invoke(Some(&continuation)),
            Err(other) => Err(Error::caused_by(CallError::NotCallable {
                found: other.type_name(),
            })),
        }
    }

    fn call_through(&self, continuation: Option<&Func>) -> Result<(), CallError> {
        let pool = self.args.pool();

        let mut args = pool.acquire();
        args.extend(self.args.iter().cloned());

        let mut results = pool.acquire();
        self.func.invoke(&mut args, &mut results)?;

        let Some(continuation) = continuation else {
            return Ok(());
        };

        check_continuation(self.func.signature(), continuation.signature())?;

        // The target consumed its arguments, so the buffer is free to receive the
        // continuation's own returns.
        args.clear();
        continuation.invoke(&mut results, &mut args)
    }

    fn describe_fault(&self, err: Error) -> Error {
        if err.kind() != ErrorKind::UnknownType {
            return err;
        }

        err.context(format!("[func: {}] [input: {:?}]", self.func.name(), self.args()))
    }
}

fn check_continuation(target: &Signature, continuation: &Signature) -> Result<(), CallError> {
    if continuation.num_in() != target.num_out() {
        return Err(CallError::ContinuationArity {
            continuation: continuation.to_string(),
            expected: target.num_out(),
            actual: continuation.num_in(),
        });
    }

    match (continuation.params().first(), target.returns().first()) {
        (Some(param), Some(ret)) if param != ret => Err(CallError::ContinuationType {
            continuation: continuation.to_string(),
            expected: ret.name(),
            found: param.name(),
        }),
        _ => Ok(()),
    }
}

#[cfg_attr(test, mutants::skip)] // Log output only, asserted through LogCapture in the integration tests.
#[cfg_attr(not(feature = "logs"), expect(unused_variables, reason = "unused when logs feature not used"))]
fn emit_failed(func: &Func, error: &Error) {
    #[cfg(feature = "logs")]
    tracing::event!(
        name: "dyncall.invoke",
        tracing::Level::DEBUG,
        func.name = func.name(),
        func.signature = %func.signature(),
        error.kind = ?error.kind(),
        error.message = %error,
    );
}
