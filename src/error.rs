//! Error types for the call engine.
//!
//! Two error surfaces exist side by side:
//!
//! - [`CallEngineError`] is returned by fallible commands (`call`, `accept`,
//!   `destroy`, ...) so callers can `match` on a category without parsing a
//!   string.
//! - [`ErrorKind`]/[`CallErrorEvent`] is the shape of the `callError`
//!   observation stream: a narrower, always-informational notification that
//!   something went wrong on the signaling or media plane, independent of
//!   whether a command is currently awaiting a result.
//!
//! # Examples
//!
//! ```
//! use callkit_rs::error::{CallEngineError, ErrorKind};
//! use callkit_rs::engine::state::CallState;
//!
//! let err = CallEngineError::StateMismatch {
//!     command: "call",
//!     state: CallState::Calling,
//! };
//! assert_eq!(err.kind(), None);
//! ```

use crate::engine::state::CallState;
use std::fmt;

/// Category of a `callError` observation.
///
/// `Normal` is reserved by the source specification for future use; no
/// engine path currently produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reserved; currently unused.
    Normal,
    /// A failure on the media plane (join/publish/subscribe/leave/track creation).
    Rtc,
    /// A failure on the signaling plane (`send_message`).
    Message,
}

/// A single `callError` observation delivered on the engine's error stream.
#[derive(Debug, Clone)]
pub struct CallErrorEvent {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for CallErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

/// Errors returned directly from a fallible [`crate::engine::CallEngine`] command.
///
/// # Examples
///
/// ```
/// use callkit_rs::error::CallEngineError;
///
/// fn describe(err: &CallEngineError) -> &'static str {
///     match err {
///         CallEngineError::StateMismatch { .. } => "programmer error: wrong state",
///         CallEngineError::Transport(_) => "signaling plane failed",
///         CallEngineError::Media(_) => "media plane failed",
///     }
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum CallEngineError {
    /// A command was issued while the engine was in a state that does not
    /// permit it (e.g. `call()` while not `Prepared`). This is a programmer
    /// error, not a runtime fault: no `callError` is emitted for it, only
    /// `callEventChanged(StateMismatch)`.
    #[error("command `{command}` is not valid in state {state:?}")]
    StateMismatch {
        command: &'static str,
        state: CallState,
    },

    /// The signaling transport's `send_message` failed.
    #[error("signaling transport failed: {0}")]
    Transport(#[source] anyhow::Error),

    /// The media client failed a join/publish/subscribe/leave/track-creation call.
    #[error("media client failed: {0}")]
    Media(#[source] anyhow::Error),
}

impl CallEngineError {
    /// Maps this error to the `callError` kind it should also be reported as,
    /// or `None` for state-mismatch errors (which are deliberately not
    /// reported on the `callError` stream).
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CallEngineError::StateMismatch { .. } => None,
            CallEngineError::Transport(_) => Some(ErrorKind::Message),
            CallEngineError::Media(_) => Some(ErrorKind::Rtc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_mismatch_has_no_error_kind() {
        let err = CallEngineError::StateMismatch {
            command: "accept",
            state: CallState::Prepared,
        };
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn transport_failure_maps_to_message_kind() {
        let err = CallEngineError::Transport(anyhow::anyhow!("boom"));
        assert_eq!(err.kind(), Some(ErrorKind::Message));
    }

    #[test]
    fn media_failure_maps_to_rtc_kind() {
        let err = CallEngineError::Media(anyhow::anyhow!("boom"));
        assert_eq!(err.kind(), Some(ErrorKind::Rtc));
    }
}
