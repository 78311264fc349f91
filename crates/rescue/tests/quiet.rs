// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Raising faults prints nothing. Each test re-runs itself in a child process so its stderr
//! can be inspected.

use rescue::flow::repeat;
use rescue::{Error, catch, raise, stop};
use testing_aids::{is_child_process, run_test_in_child};

#[test]
fn stopping_a_loop_prints_nothing() {
    if is_child_process() {
        repeat(|index| {
            if index == 2 {
                stop();
            }
        })
        .unwrap();
        return;
    }

    let output = run_test_in_child("stopping_a_loop_prints_nothing");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "child failed:\n{stderr}");
    assert!(!stderr.contains("panicked"), "unexpected stderr:\n{stderr}");
}

#[test]
fn recovered_fault_prints_nothing() {
    if is_child_process() {
        let error = catch(|| -> u8 { raise(Error::new("handled quietly")) }).unwrap_err();
        assert_eq!(error.to_string(), "handled quietly");
        return;
    }

    let output = run_test_in_child("recovered_fault_prints_nothing");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "child failed:\n{stderr}");
    assert!(!stderr.contains("panicked"), "unexpected stderr:\n{stderr}");
    assert!(!stderr.contains("handled quietly"), "unexpected stderr:\n{stderr}");
}
