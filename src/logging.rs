//! Leveled logging helpers and a redaction wrapper for sensitive fields.
//!
//! The engine logs through the standard [`log`] facade, exactly like the
//! rest of this codebase's lineage — applications choose and install their
//! own subscriber (`env_logger`, `simplelog`, ...). This module adds two
//! things a direct port of `log::info!` call sites would miss:
//!
//! - a consistent level per kind of observation (state transitions and
//!   events log at `debug`, errors at `warn`), so call sites don't have to
//!   make that call themselves, and
//! - [`Redacted`], a wrapper that makes it a compile-time impossibility for
//!   an RTC token or a view handle to show up in a derived `Debug` string.

use std::fmt;

/// Wraps a value so that its [`fmt::Debug`] and [`fmt::Display`] impls never
/// print the wrapped value, only a fixed placeholder.
///
/// [`crate::config::PrepareConfig`] stores its `rtc_token` behind this
/// wrapper specifically so a derived or hand-written `Debug` impl on the
/// config (or on anything that embeds it) can never leak it, even if a
/// future change adds a stray `{:?}` log line. Its view handles get the same
/// treatment via `PrepareConfig`'s own `Debug` impl, which prints a fixed
/// placeholder instead of formatting the handle.
#[derive(Clone)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Redacted(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn as_inner(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Logs a state transition at `debug` level.
pub fn log_state_transition(from: impl fmt::Debug, to: impl fmt::Debug, reason: impl fmt::Debug) {
    log::debug!("state {from:?} -> {to:?} (reason: {reason:?})");
}

/// Logs a granular engine event at `debug` level.
pub fn log_event(event: impl fmt::Debug) {
    log::debug!("event: {event:?}");
}

/// Logs an adapter or protocol error at `warn` level.
pub fn log_error(kind: impl fmt::Debug, message: &str) {
    log::warn!("callError ({kind:?}): {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_debug_never_prints_the_value() {
        let token = Redacted::new("super-secret-token".to_string());
        let printed = format!("{token:?}");
        assert!(!printed.contains("super-secret-token"));
        assert_eq!(printed, "<redacted>");
    }

    #[test]
    fn redacted_display_never_prints_the_value() {
        let token = Redacted::new(12345u64);
        assert_eq!(format!("{token}"), "<redacted>");
    }

    #[test]
    fn into_inner_roundtrips() {
        let token = Redacted::new("abc".to_string());
        assert_eq!(token.into_inner(), "abc");
    }
}
