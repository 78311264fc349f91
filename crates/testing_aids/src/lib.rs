// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An unpublished crate containing testing utilities for use within this repo.

use std::process::{Command, Output};
use std::sync::mpsc;
use std::time::Duration;
use std::{env, thread};

mod log;
mod macros;

pub use log::*;

/// If something (whatever) does not happen in a test within this time, the test will fail.
///
/// We are conservative here and allow much time - this is only to break out of infinite loops, not for any
/// situations that are actually expected.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable that marks a test binary as re-executed by [`run_test_in_child`].
pub const CHILD_PROCESS_ENV: &str = "TESTING_AIDS_CHILD_PROCESS";

#[must_use]
pub fn is_mutation_testing() -> bool {
    env::var("MUTATION_TESTING").as_deref() == Ok("1")
}

/// Whether the current process is a test binary re-executed by [`run_test_in_child`].
#[must_use]
pub fn is_child_process() -> bool {
    env::var_os(CHILD_PROCESS_ENV).is_some()
}

/// Executes a thread-safe function on a background thread and abandons it if
/// it does not complete before the provided timeout.
///
/// Returns `None` if the function panicked or did not finish in time.
#[cfg_attr(test, mutants::skip)] // This is test logic - pointless to mutate.
#[must_use]
pub fn execute_or_abandon<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if is_mutation_testing() {
        // Timeouts must surface as real mutation test timeouts.
        return Some(f());
    }

    let (sender, receiver) = mpsc::channel();

    // A panic drops the sender, which closes the channel just like a timeout would.
    thread::spawn(move || {
        _ = sender.send(f());
    });

    receiver.recv_timeout(TEST_TIMEOUT).ok()
}

/// Re-executes the current test binary, running only the named test with
/// [`CHILD_PROCESS_ENV`] set.
///
/// Use this for behavior that ends the process, such as exiting with a status code. The test
/// checks [`is_child_process`] to decide whether it is the child doing the work or the parent
/// inspecting the outcome.
///
/// # Panics
///
/// Panics if the current executable cannot be located or started.
#[cfg_attr(test, mutants::skip)] // This is test logic - pointless to mutate.
#[must_use]
pub fn run_test_in_child(test_name: &str) -> Output {
    let exe = env::current_exe().expect("current test executable must be known");

    Command::new(exe)
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_PROCESS_ENV, "1")
        .output()
        .expect("test executable must be able to start again")
}
