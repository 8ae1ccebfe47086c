//! The signaling envelope exchanged between two engines.
//!
//! [`CallMessage`] is the in-memory representation; [`codec::CallMessageCodec`]
//! (in the sibling `codec` module) turns it into and out of the wire string
//! carried by [`crate::transport::SignalingTransport::send_message`].

pub mod codec;

use serde::{Deserialize, Serialize};

/// What a [`CallMessage`] is requesting or announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageAction {
    VideoCall,
    AudioCall,
    Accept,
    Reject,
    Cancel,
    Hangup,
}

/// Whether a reject/cancel was produced by the application (`External`) or
/// generated automatically by the engine itself, e.g. busy auto-reject or a
/// timeout-triggered cancel (`Internal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    External,
    Internal,
}

/// The signaling-plane envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMessage {
    pub call_id: String,
    pub from_user_id: String,
    pub remote_user_id: String,
    pub from_room_id: Option<String>,
    pub action: MessageAction,
    pub reject_reason: Option<String>,
    pub reject_by_internal: Option<Origin>,
    pub cancel_call_by_internal: Option<Origin>,
}

impl CallMessage {
    /// Builds the minimal envelope for `action`, leaving the action-specific
    /// optional fields unset. Callers fill those in with the `with_*`
    /// helpers below.
    pub fn new(
        call_id: impl Into<String>,
        from_user_id: impl Into<String>,
        remote_user_id: impl Into<String>,
        action: MessageAction,
    ) -> Self {
        CallMessage {
            call_id: call_id.into(),
            from_user_id: from_user_id.into(),
            remote_user_id: remote_user_id.into(),
            from_room_id: None,
            action,
            reject_reason: None,
            reject_by_internal: None,
            cancel_call_by_internal: None,
        }
    }

    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.from_room_id = Some(room_id.into());
        self
    }

    pub fn with_reject_reason(mut self, reason: impl Into<String>) -> Self {
        self.reject_reason = Some(reason.into());
        self
    }

    pub fn with_reject_origin(mut self, origin: Origin) -> Self {
        self.reject_by_internal = Some(origin);
        self
    }

    pub fn with_cancel_origin(mut self, origin: Origin) -> Self {
        self.cancel_call_by_internal = Some(origin);
        self
    }
}
