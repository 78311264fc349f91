// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::Value;

const DEFAULT_MAX_RETAINED: usize = 256;
const DEFAULT_INITIAL_CAPACITY: usize = 8;

static GLOBAL_POOL: LazyLock<Arc<ArgPool>> = LazyLock::new(|| Arc::new(ArgPool::new(PoolOptions::default())));

/// Configuration of an [`ArgPool`].
///
/// # Defaults
///
/// | Parameter | Default Value | Configured By |
/// |-----------|---------------|---------------|
/// | Buffers kept for reuse | `256` | [`max_retained`][PoolOptions::max_retained] |
/// | Capacity of a newly allocated buffer | `8` | [`initial_capacity`][PoolOptions::initial_capacity] |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    max_retained: usize,
    initial_capacity: usize,
}

impl PoolOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many released buffers the pool keeps. Buffers released beyond that are freed.
    #[must_use]
    pub fn max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = max_retained;
        self
    }

    /// Sets the capacity of buffers allocated when the pool is empty.
    #[must_use]
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Returns how many released buffers the pool keeps.
    #[must_use]
    pub fn get_max_retained(&self) -> usize {
        self.max_retained
    }

    /// Returns the capacity of newly allocated buffers.
    #[must_use]
    pub fn get_initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_retained: DEFAULT_MAX_RETAINED,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

/// A thread-safe free list of argument buffers.
///
/// [`acquire`](Self::acquire) hands out an empty buffer, reusing a released one when available.
/// The buffer goes back to the pool when its [`PooledArgs`] guard drops, also while unwinding
/// from a fault. Released buffers are always cleared, and a buffer is owned by one guard at a
/// time.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use dyncall::{ArgPool, PoolOptions, Value};
///
/// let pool = Arc::new(ArgPool::new(PoolOptions::new().max_retained(4)));
///
/// let mut args = pool.acquire();
/// args.push(Value::new(1_u8));
/// drop(args);
///
/// assert_eq!(pool.retained(), 1);
/// assert!(pool.acquire().is_empty());
/// ```
#[derive(Debug)]
pub struct ArgPool {
    free: Mutex<Vec<Vec<Value>>>,
    options: PoolOptions,
}

impl ArgPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(options: PoolOptions) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            options,
        }
    }

    /// The process-wide pool used by [`wrap`](crate::wrap).
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_POOL)
    }

    /// The options this pool was created with.
    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Takes an empty buffer out of the pool, allocating one if none is free.
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> PooledArgs {
        let buffer = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.options.initial_capacity));

        PooledArgs {
            buffer,
            pool: Arc::clone(self),
        }
    }

    /// Number of buffers currently waiting for reuse.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut buffer: Vec<Value>) {
        buffer.clear();

        let mut free = self.free.lock();
        if free.len() < self.options.max_retained {
            free.push(buffer);
        }
    }
}

/// An argument buffer borrowed from an [`ArgPool`].
///
/// Dereferences to the underlying `Vec<Value>` and returns it to the pool on drop.
#[derive(Debug)]
pub struct PooledArgs {
    buffer: Vec<Value>,
    pool: Arc<ArgPool>,
}

impl PooledArgs {
    /// The pool this buffer returns to.
    #[must_use]
    pub fn pool(&self) -> &Arc<ArgPool> {
        &self.pool
    }
}

impl Deref for PooledArgs {
    type Target = Vec<Value>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledArgs {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledArgs {
    fn drop(&mut self) {
        self.pool.release(mem::take(&mut self.buffer));
    }
}
