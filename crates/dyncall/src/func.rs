// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{CallError, Callable, Signature, Value};

trait Invoke: Send + Sync {
    fn invoke(&self, args: &mut Vec<Value>, out: &mut Vec<Value>) -> Result<(), CallError>;
}

struct Erased<F, M> {
    f: F,
    _marker: PhantomData<fn() -> M>,
}

impl<F, M> Invoke for Erased<F, M>
where
    F: Callable<M>,
    M: 'static,
{
    fn invoke(&self, args: &mut Vec<Value>, out: &mut Vec<Value>) -> Result<(), CallError> {
        self.f.call(args, out)
    }
}

/// A type-erased callable together with its [`Signature`].
///
/// The signature is computed once, when the callable is erased, and shared by every clone of
/// the `Func`. A `Func` is itself an [`Arg`](crate::Arg), so it can travel inside a [`Value`]
/// and be wrapped again with [`wrap_value`](crate::wrap_value).
///
/// # Examples
///
/// ```rust
/// use dyncall::Func;
///
/// let func = Func::new(|left: u32, right: u32| (left.max(right),));
///
/// assert_eq!(func.signature().to_string(), "fn(u32, u32) -> u32");
/// ```
#[derive(Clone)]
pub struct Func {
    name: &'static str,
    signature: Arc<Signature>,
    target: Arc<dyn Invoke>,
}

impl Func {
    /// Erases `f`.
    #[must_use]
    pub fn new<F, M>(f: F) -> Self
    where
        F: Callable<M>,
        M: 'static,
    {
        Self {
            name: F::name(),
            signature: Arc::new(F::signature()),
            target: Arc::new(Erased { f, _marker: PhantomData }),
        }
    }

    /// The name of the function that defined the callable.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared shape of the callable.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether both handles refer to the same erased callable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }

    pub(crate) fn invoke(&self, args: &mut Vec<Value>, out: &mut Vec<Value>) -> Result<(), CallError> {
        self.target.invoke(args, out)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("signature", &format_args!("{}", self.signature))
            .finish_non_exhaustive()
    }
}
