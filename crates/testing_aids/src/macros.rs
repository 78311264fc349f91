// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Asserts that the statement panics and evaluates to the panic payload.
///
/// Usable both as a statement and as the initializer of a `let`.
// We assert unwind safety here because #[should_panic] does not require us to worry about it
// either.
#[macro_export]
macro_rules! assert_panic {
    ($stmt:stmt$(,)?) => {{
        #[allow(clippy::multi_assignments, reason = "macro untidiness")]
        #[expect(clippy::allow_attributes, reason = "macro untidiness")]
        let outcome = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| -> () { _ = { $stmt } }));

        outcome.expect_err("assert_panic! argument did not panic")
    }};
}
