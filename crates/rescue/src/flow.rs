// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Loop and background-work helpers built on recovery points.
//!
//! Every helper installs its own recovery point, so a fault raised by the supplied function
//! never escapes the helper: it is either returned, logged, or, for the [`Break`](crate::Break)
//! sentinel raised by [`stop`](crate::stop), treated as a normal end of the loop.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{Error, ErrorKind, RecoveryOptions, RecoveryPoint, catch, function_name};

/// The outcome of one loop iteration.
///
/// Implemented for `()` (keep going), [`ControlFlow<()>`] (keep going or stop), and
/// `Result` variants of both, where an `Err` ends the loop with that error. An `Err` whose
/// root cause is the [`Break`](crate::Break) sentinel stops the loop like a raised one.
pub trait Step {
    /// Converts the iteration outcome into a loop decision.
    ///
    /// # Errors
    ///
    /// Returns the error that should end the loop.
    fn into_flow(self) -> Result<ControlFlow<()>, Error>;
}

impl Step for () {
    fn into_flow(self) -> Result<ControlFlow<()>, Error> {
        Ok(ControlFlow::Continue(()))
    }
}

impl Step for ControlFlow<()> {
    fn into_flow(self) -> Result<ControlFlow<()>, Error> {
        Ok(self)
    }
}

impl Step for Result<(), Error> {
    fn into_flow(self) -> Result<ControlFlow<()>, Error> {
        self.map(|()| ControlFlow::Continue(())).into_flow()
    }
}

impl Step for Result<ControlFlow<()>, Error> {
    fn into_flow(self) -> Result<ControlFlow<()>, Error> {
        match self {
            Err(err) if err.is_break() => Ok(ControlFlow::Break(())),
            other => other,
        }
    }
}

/// A timeout reported by [`run_with_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation did not finish within {after:?}")]
pub struct Timeout {
    after: Duration,
}

impl Timeout {
    /// The time budget that was exceeded.
    #[must_use]
    pub fn after(&self) -> Duration {
        self.after
    }
}

/// Calls `f` with the indices `0, 1, 2, ...` until it asks to stop.
///
/// The loop ends successfully when `f` returns [`ControlFlow::Break`], or raises or returns the
/// [`Break`](crate::Break) sentinel, and with an error when `f` returns or raises anything
/// else.
///
/// # Examples
///
/// ```rust
/// use std::ops::ControlFlow;
///
/// let mut calls = 0;
/// rescue::flow::repeat(|index| {
///     calls += 1;
///     if index == 5 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
/// })
/// .unwrap();
///
/// assert_eq!(calls, 6);
/// ```
///
/// # Errors
///
/// Returns the error that ended the loop.
pub fn repeat<S, F>(mut f: F) -> Result<(), Error>
where
    S: Step,
    F: FnMut(usize) -> S,
{
    let mut failure = None;

    let outcome = RecoveryPoint::break_aware(|err| failure = Some(err)).run(|| -> Result<(), Error> {
        for index in 0_usize.. {
            if f(index).into_flow()?.is_break() {
                break;
            }
        }
        Ok(())
    });

    match (outcome, failure) {
        (Some(result), _) => result,
        (None, Some(err)) => Err(err),
        // The sentinel was swallowed by the recovery point.
        (None, None) => Ok(()),
    }
}

/// Runs `f` on a new thread whose faults are logged instead of tearing the thread down.
pub fn spawn<F>(f: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    let name = function_name::<F>();

    thread::spawn(move || {
        RecoveryPoint::handler(|err| report_background_fault("spawn", &err))
            .options(RecoveryOptions::new().caption(name))
            .run(f);
    })
}

/// Cancels a loop started by [`spawn_loop`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the loop to end before its next iteration.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the loop was asked to end, or already ended.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A loop running on a background thread.
#[derive(Debug)]
pub struct LoopHandle {
    token: CancelToken,
    thread: JoinHandle<()>,
}

impl LoopHandle {
    /// The token observed by the loop.
    #[must_use]
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Requests the loop to end before its next iteration.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for the loop thread to finish.
    ///
    /// # Errors
    ///
    /// Returns the payload of a panic that escaped the loop thread.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Calls `f` repeatedly on a new thread until the returned handle is cancelled.
///
/// The loop also ends when `f` raises the [`Break`](crate::Break) sentinel, or any other fault,
/// which is logged. Either way the token reads as cancelled afterwards.
pub fn spawn_loop<F>(mut f: F) -> LoopHandle
where
    F: FnMut(&CancelToken) + Send + 'static,
{
    let name = function_name::<F>();
    let token = CancelToken::new();
    let observed = token.clone();

    let thread = thread::spawn(move || {
        RecoveryPoint::break_aware(|err| report_background_fault("spawn_loop", &err))
            .options(RecoveryOptions::new().caption(name))
            .run(|| {
                while !observed.is_cancelled() {
                    f(&observed);
                }
            });

        observed.cancel();
    });

    LoopHandle { token, thread }
}

/// Runs `f` on a worker thread and waits at most `timeout` for it.
///
/// When the time budget runs out the worker is abandoned, not stopped; it keeps running
/// in the background until `f` returns.
///
/// # Errors
///
/// Returns an [`ErrorKind::Timeout`] error when `f` does not finish in time, the classified
/// fault (with the function's name as context) when `f` raises one, and an error when
/// `timeout` is zero.
pub fn run_with_timeout<F>(timeout: Duration, f: F) -> Result<(), Error>
where
    F: FnOnce() + Send + 'static,
{
    if timeout.is_zero() {
        return Err(Error::new("timeout must be greater than zero"));
    }

    let name = function_name::<F>();
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let outcome = catch(f).map_err(|err| err.context(format!("func: {name}")));
        // The receiver is gone once the caller gave up waiting.
        _ = sender.send(outcome);
    });

    match receiver.recv_timeout(timeout) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => Err(Error::from_parts(
            ErrorKind::Timeout,
            format!("func: {name}"),
            Some(Box::new(Timeout { after: timeout })),
        )),
        Err(RecvTimeoutError::Disconnected) => Err(Error::new(format!("func: {name} exited without reporting"))),
    }
}

/// Runs `f`, then sleeps for `delay` unless `f` raised a fault.
///
/// # Errors
///
/// Returns the classified fault raised by `f`, or an error when `delay` is zero.
pub fn run_then_delay<F>(delay: Duration, f: F) -> Result<(), Error>
where
    F: FnOnce(),
{
    if delay.is_zero() {
        return Err(Error::new("delay must be greater than zero"));
    }

    catch(f).map_err(|err| err.context("delayed call failed"))?;
    thread::sleep(delay);
    Ok(())
}

/// Measures how long `f` takes.
///
/// A fault raised by `f` propagates to the caller.
pub fn cost<F>(f: F) -> Duration
where
    F: FnOnce(),
{
    let start = Instant::now();
    f();
    start.elapsed()
}

#[cfg_attr(not(feature = "logs"), expect(unused_variables, reason = "unused when logs feature not used"))]
fn report_background_fault(helper: &'static str, error: &Error) {
    #[cfg(feature = "logs")]
    tracing::event!(
        name: "rescue.flow.fault",
        tracing::Level::ERROR,
        flow.helper = helper,
        error.caller = error.caller().unwrap_or_default(),
        error.message = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Break, raise, stop};

    #[test]
    fn unit_steps_run_until_stopped() {
        let mut seen = Vec::new();

        repeat(|index| {
            if index == 2 {
                stop();
            }
            seen.push(index);
        })
        .unwrap();

        assert_eq!(seen, [0, 1]);
    }

    #[test]
    fn returned_error_ends_loop() {
        let error = repeat(|index| if index == 1 { Err(Error::new("second")) } else { Ok(()) }).unwrap_err();

        assert_eq!(error.to_string(), "second");
    }

    #[test]
    fn returned_break_stops_like_raised_break() {
        let mut returned = 0;
        repeat(|index| {
            returned += 1;
            if index == 3 { Err(Error::caused_by(Break)) } else { Ok(()) }
        })
        .unwrap();

        let mut raised = 0;
        repeat(|index| {
            raised += 1;
            if index == 3 {
                stop();
            }
        })
        .unwrap();

        assert_eq!(returned, 4);
        assert_eq!(raised, 4);
    }

    #[test]
    fn returned_break_with_context_stops() {
        repeat(|_| -> Result<ControlFlow<()>, Error> { Err(Error::caused_by(Break).context("drained")) }).unwrap();
    }

    #[test]
    fn raised_fault_ends_loop_with_error() {
        let error = repeat(|_| -> Result<(), Error> { raise(Error::new("first")) }).unwrap_err();

        assert_eq!(error.to_string(), "first");
    }

    #[test]
    fn zero_durations_are_rejected() {
        run_with_timeout(Duration::ZERO, || ()).unwrap_err();
        run_then_delay(Duration::ZERO, || ()).unwrap_err();
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();

        clone.cancel();

        assert!(token.is_cancelled());
    }
}
