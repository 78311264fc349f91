// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, type_name};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::process;

use crate::{Error, RecoveryOptions, recover};

/// A recovery boundary that intercepts faults raised inside it.
///
/// A recovery point is armed when constructed and fires at most once: [`run`](Self::run)
/// consumes it. When the closure returns normally the point is disarmed and nothing happens.
/// When the closure raises, the fault is classified into an [`Error`] and dispatched according
/// to the flavor:
///
/// | Flavor | On fault |
/// |--------|----------|
/// | [`fatal`](Self::fatal) | report the error and terminate the process |
/// | [`handler`](Self::handler) | attribute the error to the handler's defining function and call the handler |
/// | [`error_slot`](Self::error_slot) | store the error into the slot |
/// | [`break_aware`](Self::break_aware) | like `handler`, but swallow the [`Break`](crate::Break) sentinel |
///
/// The faulted code is never re-entered.
///
/// # Examples
///
/// ```rust
/// use rescue::{Error, RecoveryPoint, raise};
///
/// let mut slot = None;
/// let value = RecoveryPoint::error_slot(&mut slot).run(|| -> u32 { raise(Error::new("no quota")) });
///
/// assert_eq!(value, None);
/// assert_eq!(slot.unwrap().to_string(), "no quota");
/// ```
pub struct RecoveryPoint<'a> {
    policy: Policy<'a>,
    options: RecoveryOptions,
}

enum Policy<'a> {
    Fatal,
    Handler {
        handler: Box<dyn FnOnce(Error) + 'a>,
        caller: &'static str,
    },
    ErrorSlot(&'a mut Option<Error>),
    BreakAware {
        handler: Box<dyn FnOnce(Error) + 'a>,
        caller: &'static str,
    },
}

impl<'a> RecoveryPoint<'a> {
    /// A recovery point that treats any fault as a bug: it reports the error and exits the
    /// process with [`RecoveryOptions::exit_code`].
    #[must_use]
    pub fn fatal() -> Self {
        Self::with_policy(Policy::Fatal)
    }

    /// A recovery point that hands the classified error to `handler`.
    ///
    /// The error is attributed to the function that defined `handler`, not to the recovery
    /// point, unless [`RecoveryOptions::caption`] says otherwise.
    #[must_use]
    pub fn handler<H>(handler: H) -> Self
    where
        H: FnOnce(Error) + 'a,
    {
        Self::with_policy(Policy::Handler {
            handler: Box::new(handler),
            caller: function_name::<H>(),
        })
    }

    /// A recovery point that stores the classified error into `slot` and lets execution
    /// continue after it.
    #[must_use]
    pub fn error_slot(slot: &'a mut Option<Error>) -> Self {
        Self::with_policy(Policy::ErrorSlot(slot))
    }

    /// A handler recovery point that treats the [`Break`](crate::Break) sentinel as a normal
    /// end of iteration: such a fault is swallowed and `handler` is not called.
    #[must_use]
    pub fn break_aware<H>(handler: H) -> Self
    where
        H: FnOnce(Error) + 'a,
    {
        Self::with_policy(Policy::BreakAware {
            handler: Box::new(handler),
            caller: function_name::<H>(),
        })
    }

    /// Replaces the options of this recovery point.
    #[must_use]
    pub fn options(mut self, options: RecoveryOptions) -> Self {
        self.options = options;
        self
    }

    fn with_policy(policy: Policy<'a>) -> Self {
        Self {
            policy,
            options: RecoveryOptions::default(),
        }
    }

    /// Runs `f` under this recovery point.
    ///
    /// Returns `Some` with the closure's value when it completes normally and `None` when it
    /// raised a fault that was dispatched.
    pub fn run<T>(self, f: impl FnOnce() -> T) -> Option<T> {
        // The closure is abandoned on a fault and never observed again, so any state it broke
        // stays out of reach of this recovery point.
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(payload) => {
                self.dispatch(Some(payload));
                None
            }
        }
    }

    /// Dispatches the content of a recovery slot, typically the result of
    /// [`std::panic::catch_unwind`].
    ///
    /// An empty slot means nothing was raised: no handler is called, no slot is written.
    pub fn dispatch(self, payload: Option<Box<dyn Any + Send>>) {
        let Some(error) = recover(payload) else {
            return;
        };

        let Self { policy, options } = self;

        match policy {
            Policy::Fatal => terminate(&error, &options),
            Policy::Handler { handler, caller } => {
                let error = attribute(error, caller, &options);
                emit_recovered(&error, &options);
                handler(error);
            }
            Policy::ErrorSlot(slot) => {
                emit_recovered(&error, &options);
                *slot = Some(error);
            }
            Policy::BreakAware { handler, caller } => {
                if error.is_break() {
                    return;
                }

                let error = attribute(error, caller, &options);
                emit_recovered(&error, &options);
                handler(error);
            }
        }
    }
}

impl fmt::Debug for RecoveryPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flavor = match &self.policy {
            Policy::Fatal => "fatal",
            Policy::Handler { .. } => "handler",
            Policy::ErrorSlot(_) => "error_slot",
            Policy::BreakAware { .. } => "break_aware",
        };

        f.debug_struct("RecoveryPoint")
            .field("flavor", &flavor)
            .field("options", &self.options)
            .finish()
    }
}

/// Runs `f`, returning the classified error if it raised a fault.
///
/// # Examples
///
/// ```rust
/// use rescue::{ErrorKind, catch};
///
/// let error = catch(|| -> u8 { panic!("overflow") }).unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::UnknownType);
///
/// assert_eq!(catch(|| 7).unwrap(), 7);
/// ```
///
/// # Errors
///
/// Returns the classified fault when `f` raises one.
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, Error> {
    let mut slot = None;
    let value = RecoveryPoint::error_slot(&mut slot).run(f);

    value.ok_or_else(|| slot.unwrap_or_else(|| Error::new("fault was raised but left nothing to classify")))
}

/// Runs `f`, passing the classified error to `handler` if it raised a fault.
pub fn handle<T, H>(f: impl FnOnce() -> T, handler: H) -> Option<T>
where
    H: FnOnce(Error),
{
    RecoveryPoint::handler(handler).run(f)
}

/// Runs `f`, terminating the process with exit code 1 if it raised a fault.
pub fn fatal<T>(f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let error = recover(Some(payload)).unwrap_or_else(|| Error::new("fault was raised but left nothing to classify"));
            terminate(&error, &RecoveryOptions::default())
        }
    }
}

/// The path of the function that defined `F`.
///
/// Closure types are named after their enclosing function, so this names the function a
/// closure came from; for function items it is the function itself.
///
/// # Examples
///
/// ```rust
/// fn origin() -> &'static str {
///     let callback = || ();
///     rescue::function_name_of(&callback)
/// }
///
/// assert!(origin().ends_with("origin"));
/// ```
#[must_use]
pub fn function_name<F: ?Sized>() -> &'static str {
    let mut name = type_name::<F>();
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name
}

/// Like [`function_name`], inferring the type from a value.
#[must_use]
pub fn function_name_of<F: ?Sized>(_: &F) -> &'static str {
    function_name::<F>()
}

fn attribute(error: Error, caller: &'static str, options: &RecoveryOptions) -> Error {
    match options.get_caption() {
        Some(caption) => error.with_caller(caption.to_owned()),
        None => error.with_caller(caller),
    }
}

#[cfg_attr(not(feature = "logs"), expect(unused_variables, reason = "unused when logs feature not used"))]
fn emit_recovered(error: &Error, options: &RecoveryOptions) {
    #[cfg(feature = "logs")]
    if options.get_logs_enabled() {
        tracing::event!(
            name: "rescue.recovered",
            tracing::Level::DEBUG,
            error.kind = ?error.kind(),
            error.caller = error.caller().unwrap_or_default(),
            error.message = %error,
        );
    }
}

#[cfg_attr(test, mutants::skip)] // Terminates the process, covered by the fatal integration test.
fn terminate(error: &Error, options: &RecoveryOptions) -> ! {
    #[cfg(feature = "logs")]
    if options.get_logs_enabled() {
        tracing::event!(
            name: "rescue.fatal",
            tracing::Level::ERROR,
            error.kind = ?error.kind(),
            error.message = %error,
        );
    }

    eprintln!("fatal: {error:#}");

    process::exit(options.get_exit_code())
}
