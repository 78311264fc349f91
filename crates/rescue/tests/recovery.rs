// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Recovery point dispatch, using only the public API.

use std::cell::Cell;
use std::io;

use rescue::{Break, Error, ErrorKind, RecoveryOptions, RecoveryPoint, catch, handle, raise, stop};
use testing_aids::LogCapture;

fn fail_with_io() -> u32 {
    raise(Error::caused_by(io::Error::other("socket reset")))
}

#[test]
fn handler_is_not_called_without_fault() {
    let calls = Cell::new(0);

    let value = handle(|| 11, |_| calls.set(calls.get() + 1));

    assert_eq!(value, Some(11));
    assert_eq!(calls.get(), 0);
}

#[test]
fn handler_receives_classified_error_once() {
    let calls = Cell::new(0);
    let mut kind = None;

    let value = handle(fail_with_io, |err| {
        calls.set(calls.get() + 1);
        kind = Some(err.kind());
    });

    assert_eq!(value, None);
    assert_eq!(calls.get(), 1);
    assert_eq!(kind, Some(ErrorKind::Native));
}

#[test]
fn code_after_fault_is_not_resumed() {
    let reached = Cell::new(false);

    let _ = catch(|| {
        fail_with_io();
        reached.set(true);
    });

    assert!(!reached.get());
}

#[test]
fn handler_error_is_attributed_to_defining_function() {
    let mut caller = None;

    RecoveryPoint::handler(|err: Error| caller = err.caller().map(str::to_owned)).run(fail_with_io);

    assert!(caller.unwrap().ends_with("handler_error_is_attributed_to_defining_function"));
}

#[test]
fn caption_overrides_attribution() {
    let mut caller = None;

    RecoveryPoint::handler(|err: Error| caller = err.caller().map(str::to_owned))
        .options(RecoveryOptions::new().caption("ledger::post"))
        .run(fail_with_io);

    assert_eq!(caller.as_deref(), Some("ledger::post"));
}

#[test]
fn error_slot_keeps_instance_and_continues() {
    let original = Error::new("slotted");
    let raised = original.clone();
    let mut slot = None;

    let value = RecoveryPoint::error_slot(&mut slot).run(move || -> u8 { raise(raised) });

    assert_eq!(value, None);
    assert!(slot.unwrap().ptr_eq(&original));
}

#[test]
fn break_aware_swallows_stop() {
    let calls = Cell::new(0);

    RecoveryPoint::break_aware(|_| calls.set(calls.get() + 1)).run(|| -> u8 { stop() });

    assert_eq!(calls.get(), 0);
}

#[test]
fn break_wrapped_in_context_is_still_swallowed() {
    let calls = Cell::new(0);

    RecoveryPoint::break_aware(|_| calls.set(calls.get() + 1)).run(|| -> u8 { raise(Error::caused_by(Break).context("in loop")) });

    assert_eq!(calls.get(), 0);
}

#[test]
fn recovered_fault_is_logged() {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    RecoveryPoint::handler(|_| ()).run(fail_with_io);

    capture.assert_contains("DEBUG");
    capture.assert_contains("error.kind=Native");
    capture.assert_contains("socket reset");
    capture.assert_contains("recovered_fault_is_logged");
}

#[test]
fn logs_can_be_disabled() {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    RecoveryPoint::handler(|_| ())
        .options(RecoveryOptions::new().logs_enabled(false))
        .run(fail_with_io);

    capture.assert_empty();
}

#[test]
fn swallowed_break_is_not_logged() {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    RecoveryPoint::break_aware(|_| ()).run(|| -> u8 { stop() });

    capture.assert_empty();
}
