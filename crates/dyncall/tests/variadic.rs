// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Variadic callables, using only the public API.

use std::sync::{Arc, Mutex};

use dyncall::{Arity, CallError, Value, args, variadic, wrap};
use rescue::catch;
use rstest::rstest;

#[rstest]
#[case::only_fixed(args!["head".to_owned()], 0)]
#[case::one_extra(args!["head".to_owned(), 1_u16], 1)]
#[case::many_extra(args!["head".to_owned(), 1_u16, 2_u16, 3_u16, 4_u16], 4)]
fn accepts_fixed_count_or_more(#[case] values: Vec<Value>, #[case] tail: usize) {
    let seen = Arc::new(Mutex::new(None));
    let record = Arc::clone(&seen);

    wrap(variadic(move |head: String, rest: Vec<u16>| {
        *record.lock().unwrap() = Some((head, rest.len()));
    }))
    .bind(values)
    .call()
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(("head".to_owned(), tail)));
}

#[test]
fn fewer_than_fixed_is_fatal() {
    let binder = wrap(variadic(|_: u8, _: u8, _: Vec<u8>| ()));

    let error = catch(|| binder.bind(args![1_u8])).unwrap_err();

    assert_eq!(
        error.find_source::<CallError>(),
        Some(&CallError::ArgCount {
            signature: "fn(u8, u8, ...u8)".to_owned(),
            expected: Arity::AtLeast(2),
            actual: 1,
        })
    );
}

#[test]
fn present_tail_values_are_kept_and_nil_ones_zeroed() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);

    wrap(variadic(move |rest: Vec<String>| record.lock().unwrap().extend(rest)))
        .bind(vec![
            Value::new("a".to_owned()),
            Value::nil::<String>(),
            Value::absent(),
            Value::new("d".to_owned()),
        ])
        .call()
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), ["a", "", "", "d"]);
}

#[test]
fn mistyped_tail_value_is_reported() {
    let error = wrap(variadic(|_: Vec<u8>| ())).bind(args![1_u8, "two"]).call().unwrap_err();

    assert!(matches!(
        error.find_source::<CallError>(),
        Some(CallError::ArgType {
            index: 1,
            expected: "u8",
            ..
        })
    ));
}

#[test]
fn variadic_signature_shape() {
    let binder = wrap(variadic(|_: i32, _: Vec<String>| (0_i32,)));
    let signature = binder.signature();

    assert!(signature.is_variadic());
    assert_eq!(signature.num_in(), 2);
    assert_eq!(signature.arity(), Arity::AtLeast(1));
    assert!(binder.func().name().ends_with("variadic_signature_shape"));
}
