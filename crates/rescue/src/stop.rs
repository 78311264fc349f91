// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{Fault, raise};

/// The stop sentinel: a fault that means "end the iteration", not "something failed".
///
/// [`stop`] raises it. A [`RecoveryPoint::break_aware`](crate::RecoveryPoint::break_aware)
/// recovery point and the [`flow`](crate::flow) loop helpers recognize it through
/// [`Error::is_break`](crate::Error::is_break) and swallow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, thiserror::Error)]
#[error("break")]
pub struct Break;

impl From<Break> for Fault {
    fn from(sentinel: Break) -> Self {
        Self::native(sentinel)
    }
}

/// Raises the [`Break`] sentinel to end the surrounding loop successfully.
///
/// Like [`raise`], this prints nothing.
///
/// # Examples
///
/// ```rust
/// let mut seen = Vec::new();
///
/// rescue::flow::repeat(|index| {
///     if index == 3 {
///         rescue::stop();
///     }
///     seen.push(index);
/// })
/// .unwrap();
///
/// assert_eq!(seen, [0, 1, 2]);
/// ```
pub fn stop() -> ! {
    raise(Break)
}
