// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

pub(crate) const DEFAULT_EXIT_CODE: i32 = 1;

/// Configuration shared by all recovery point flavors.
///
/// Setters take plain names (`exit_code()`), getters carry a `get_` prefix
/// (`get_exit_code()`), since options are written far more often than read.
///
/// # Defaults
///
/// | Parameter | Default Value | Configured By |
/// |-----------|---------------|---------------|
/// | Exit code of a fatal recovery point | `1` | [`exit_code`][RecoveryOptions::exit_code] |
/// | Log events on recovery | `true` (with the `logs` feature) | [`logs_enabled`][RecoveryOptions::logs_enabled] |
/// | Caller attribution override | derived from the handler | [`caption`][RecoveryOptions::caption] |
///
/// # Examples
///
/// ```rust
/// use rescue::{RecoveryOptions, RecoveryPoint};
///
/// let options = RecoveryOptions::new().caption("billing::settle").logs_enabled(false);
///
/// let mut seen = None;
/// RecoveryPoint::handler(|err| seen = err.caller().map(str::to_owned))
///     .options(options)
///     .run(|| rescue::raise(rescue::Error::new("declined")));
///
/// assert_eq!(seen.as_deref(), Some("billing::settle"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOptions {
    exit_code: i32,
    logs_enabled: bool,
    caption: Option<Cow<'static, str>>,
}

impl RecoveryOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exit code used when a fatal recovery point terminates the process.
    #[must_use]
    pub fn exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Enables or disables log events emitted when a fault is recovered.
    #[must_use]
    pub fn logs_enabled(mut self, enabled: bool) -> Self {
        self.logs_enabled = enabled;
        self
    }

    /// Attributes recovered errors to the given caller instead of the one derived from the
    /// handler's type.
    #[must_use]
    pub fn caption(mut self, caption: impl Into<Cow<'static, str>>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Returns the configured fatal exit code.
    #[must_use]
    pub fn get_exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns whether log events are emitted.
    #[must_use]
    pub fn get_logs_enabled(&self) -> bool {
        self.logs_enabled
    }

    /// Returns the caller attribution override, if any.
    #[must_use]
    pub fn get_caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            exit_code: DEFAULT_EXIT_CODE,
            logs_enabled: true,
            caption: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = RecoveryOptions::default();

        assert_eq!(options.get_exit_code(), 1);
        assert!(options.get_logs_enabled());
        assert_eq!(options.get_caption(), None);
    }

    #[test]
    fn setters_override_defaults() {
        let options = RecoveryOptions::new().exit_code(3).logs_enabled(false).caption("job");

        assert_eq!(options.get_exit_code(), 3);
        assert!(!options.get_logs_enabled());
        assert_eq!(options.get_caption(), Some("job"));
    }
}
