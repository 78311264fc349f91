// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Concurrent binding and invocation, using only the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use dyncall::{ArgPool, PoolOptions, args, wrap, wrap_with_pool};
use testing_aids::execute_or_abandon;

const THREADS: usize = 128;
const ROUNDS: usize = 50;

#[test]
fn parallel_wraps_see_only_their_own_arguments() {
    let completed = execute_or_abandon(|| {
        let calls = Arc::new(AtomicUsize::new(0));

        thread::scope(|scope| {
            for id in 0..THREADS {
                let calls = Arc::clone(&calls);

                scope.spawn(move || {
                    for round in 0..ROUNDS {
                        let expected = format!("{id}:{round}");

                        let bound = wrap(|id: usize, label: String| (id, label)).bind(args![id, expected.clone()]);

                        let calls = Arc::clone(&calls);
                        bound
                            .then(move |seen_id: usize, seen_label: String| {
                                assert_eq!(seen_id, id);
                                assert_eq!(seen_label, expected);
                                calls.fetch_add(1, Ordering::Relaxed);
                            })
                            .unwrap();
                    }
                });
            }
        });

        calls.load(Ordering::Relaxed)
    });

    assert_eq!(completed, Some(THREADS * ROUNDS));
}

#[test]
fn shared_bound_call_across_threads() {
    let pool = Arc::new(ArgPool::new(PoolOptions::new().max_retained(16)));
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let bound = wrap_with_pool(
        move |a: u32, b: u32| {
            assert_eq!((a, b), (1, 2));
            counter.fetch_add(1, Ordering::Relaxed);
        },
        Arc::clone(&pool),
    )
    .bind(args![1_u32, 2_u32]);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| bound.call().unwrap());
        }
    });

    assert_eq!(hits.load(Ordering::Relaxed), THREADS);
    assert!(pool.retained() <= 16);
}
