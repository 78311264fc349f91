// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Wrapping and binding, using only the public API.

use std::sync::{Arc, Mutex};

use dyncall::{ArgPool, Arity, CallError, Func, PoolOptions, Value, args, wrap, wrap_value, wrap_with_pool};
use rescue::{Error, ErrorKind, catch};
use rstest::rstest;
use testing_aids::{LogCapture, assert_panic};

fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    (Arc::clone(&seen), seen)
}

#[test]
fn arguments_are_forwarded_exactly() {
    let (seen, record) = recorder();

    wrap(move |a: i32, b: String, c: bool| record.lock().unwrap().push((a, b, c)))
        .bind(args![7, "seven".to_owned(), true])
        .call()
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), [(7, "seven".to_owned(), true)]);
}

#[test]
fn zero_argument_callable() {
    let (seen, record) = recorder();

    wrap(move || record.lock().unwrap().push(())).bind(args![]).call().unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
}

fn double(value: u64) -> (u64,) {
    (value * 2,)
}

#[test]
fn single_value_is_returned_as_one_element_tuple() {
    let (seen, record) = recorder();
    let binder = wrap(|x: i32| (x * 2,));

    binder
        .bind(args![21])
        .then(move |doubled: i32| record.lock().unwrap().push(doubled))
        .unwrap();

    assert_eq!(binder.signature().to_string(), "fn(i32) -> i32");
    assert_eq!(*seen.lock().unwrap(), [42]);
}

#[test]
fn function_items_are_named() {
    let binder = wrap(double);

    assert!(binder.func().name().ends_with("double"));
    assert_eq!(binder.signature().to_string(), "fn(u64) -> u64");
}

#[rstest]
#[case::too_few(args![1])]
#[case::too_many(args![1, 2, 3])]
fn wrong_arity_is_rejected(#[case] values: Vec<Value>) {
    let actual = values.len();

    let error = wrap(|_: i32, _: i32| ()).try_bind(values).unwrap_err();

    assert_eq!(
        error,
        CallError::ArgCount {
            signature: "fn(i32, i32)".to_owned(),
            expected: Arity::Exactly(2),
            actual,
        }
    );
}

#[test]
fn bind_raises_on_wrong_arity() {
    let binder = wrap(|_: i32| ());

    let error = catch(|| binder.bind(args![])).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Native);
    assert!(matches!(
        error.find_source::<CallError>(),
        Some(CallError::ArgCount { actual: 0, .. })
    ));
}

#[test]
fn nil_arguments_reach_target_as_zero_values() {
    let (seen, record) = recorder();

    wrap(move |count: usize, label: String, tags: Vec<String>, maybe: Option<u8>| {
        record.lock().unwrap().push((count, label, tags, maybe));
    })
    .bind(vec![
        Value::absent(),
        Value::of_option(None::<String>),
        Value::nil::<Vec<String>>(),
        Value::nil::<Option<u8>>(),
    ])
    .call()
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), [(0, String::new(), Vec::new(), None)]);
}

#[test]
fn mistyped_argument_is_returned_as_error() {
    let bound = wrap(|_: u8| ()).bind(args!["not a byte"]);

    let error = bound.call().unwrap_err();

    assert_eq!(
        error.find_source::<CallError>(),
        Some(&CallError::ArgType {
            index: 0,
            expected: "u8",
            found: "&str",
        })
    );
}

#[test]
fn target_fault_is_returned_not_raised() {
    let bound = wrap(|reason: String| -> () { rescue::raise(Error::new(reason)) }).bind(args!["quota exceeded".to_owned()]);

    let error = bound.call().unwrap_err();

    assert_eq!(error.to_string(), "quota exceeded");
}

#[test]
fn bound_call_can_be_repeated() {
    let (seen, record) = recorder();
    let bound = wrap(move |value: u8| record.lock().unwrap().push(value)).bind(args![4_u8]);

    bound.call().unwrap();
    bound.call().unwrap();

    assert_eq!(*seen.lock().unwrap(), [4, 4]);
}

#[test]
fn wrap_value_accepts_func() {
    let (seen, record) = recorder();
    let func = Func::new(move |value: i64| record.lock().unwrap().push(value));

    wrap_value(Value::new(func)).bind(args![-1_i64]).call().unwrap();

    assert_eq!(*seen.lock().unwrap(), [-1]);
}

#[rstest]
#[case::absent(Value::absent())]
#[case::nil(Value::nil::<Func>())]
fn wrap_value_of_nothing_is_fatal(#[case] target: Value) {
    let payload = assert_panic!(drop(wrap_value(target)));

    let error = rescue::recover(Some(payload)).unwrap();
    assert_eq!(error.find_source::<CallError>(), Some(&CallError::NilTarget));
}

#[test]
fn wrap_value_of_non_callable_is_fatal() {
    let error = catch(|| wrap_value(Value::new(5_u32))).unwrap_err();

    assert_eq!(error.find_source::<CallError>(), Some(&CallError::NotCallable { found: "u32" }));
}

#[test]
fn explicit_pool_is_used() {
    let pool = Arc::new(ArgPool::new(PoolOptions::new().max_retained(8)));

    let bound = wrap_with_pool(|_: u8, _: u8| (), Arc::clone(&pool)).bind(args![1_u8, 2_u8]);
    bound.call().unwrap();
    drop(bound);

    assert!(pool.retained() >= 1);
    assert!(pool.retained() <= 8);
}

#[test]
fn failed_invocation_is_logged() {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let bound = wrap(|_: u8| ()).bind(args!["wrong"]);
    bound.call().unwrap_err();

    capture.assert_contains("DEBUG");
    capture.assert_contains("func.signature=fn(u8)");
    capture.assert_contains("argument 0 must be u8");
}
