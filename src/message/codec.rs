//! Encodes [`CallMessage`] envelopes to/from the wire string carried by the
//! signaling transport, and holds the call id that gets stamped onto every
//! outbound message.

use super::CallMessage;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// On-wire representation: a version tag plus the flattened envelope
/// fields. JSON, not a bespoke binary format — self-describing without
/// inventing new wire machinery.
#[derive(Serialize, Deserialize)]
struct Wire {
    version: u8,
    #[serde(flatten)]
    message: CallMessage,
}

/// Stateful codec: encoding stamps the currently-held `call_id` onto every
/// outbound envelope so callers never have to thread it through manually.
#[derive(Debug, Clone, Default)]
pub struct CallMessageCodec {
    call_id: Option<String>,
}

impl CallMessageCodec {
    /// Wire format version produced by `encode` and required by `decode`.
    pub const VERSION: u8 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a freshly generated call id, held until `clear_call_id` is
    /// called. Used by `call()` when originating an invite.
    pub fn assign_call_id(&mut self, call_id: impl Into<String>) {
        self.call_id = Some(call_id.into());
    }

    /// Adopts a call id received from the peer's initial invite.
    /// Semantically distinct from `assign_call_id` only in caller intent;
    /// both simply hold the id for subsequent `encode` calls.
    pub fn hold_call_id(&mut self, call_id: impl Into<String>) {
        self.assign_call_id(call_id);
    }

    pub fn clear_call_id(&mut self) {
        self.call_id = None;
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    /// Encodes `message` to its wire payload, overwriting `message.call_id`
    /// with the currently held id if one is set.
    pub fn encode(&self, mut message: CallMessage) -> Result<String> {
        if let Some(call_id) = &self.call_id {
            message.call_id = call_id.clone();
        }
        let wire = Wire {
            version: Self::VERSION,
            message,
        };
        serde_json::to_string(&wire).context("failed to encode call message")
    }

    /// Decodes `payload` into a [`CallMessage`], rejecting payloads produced
    /// by an incompatible codec version.
    pub fn decode(&self, payload: &str) -> Result<CallMessage> {
        let wire: Wire = serde_json::from_str(payload).context("failed to decode call message")?;
        if wire.version != Self::VERSION {
            bail!(
                "unsupported call message codec version: {} (expected {})",
                wire.version,
                Self::VERSION
            );
        }
        Ok(wire.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageAction, Origin};

    fn sample() -> CallMessage {
        CallMessage::new("call-1", "alice", "bob", MessageAction::VideoCall)
            .with_room_id("room-7")
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let codec = CallMessageCodec::new();
        let message = sample();
        let payload = codec.encode(message.clone()).unwrap();
        let decoded = codec.decode(&payload).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn encode_stamps_the_held_call_id() {
        let mut codec = CallMessageCodec::new();
        codec.assign_call_id("held-id");
        let payload = codec.encode(sample()).unwrap();
        let decoded = codec.decode(&payload).unwrap();
        assert_eq!(decoded.call_id, "held-id");
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let codec = CallMessageCodec::new();
        let wire = Wire {
            version: 99,
            message: sample(),
        };
        let payload = serde_json::to_string(&wire).unwrap();
        assert!(codec.decode(&payload).is_err());
    }

    #[test]
    fn round_trips_all_optional_fields() {
        let codec = CallMessageCodec::new();
        let message = CallMessage::new("call-2", "bob", "alice", MessageAction::Reject)
            .with_reject_reason("busy")
            .with_reject_origin(Origin::Internal)
            .with_cancel_origin(Origin::External);

        let payload = codec.encode(message.clone()).unwrap();
        let decoded = codec.decode(&payload).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn clear_call_id_stops_stamping() {
        let mut codec = CallMessageCodec::new();
        codec.assign_call_id("temp");
        codec.clear_call_id();
        let payload = codec.encode(sample()).unwrap();
        let decoded = codec.decode(&payload).unwrap();
        assert_eq!(decoded.call_id, "call-1");
    }
}
