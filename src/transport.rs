//! The signaling transport boundary.
//!
//! A [`SignalingTransport`] is a reliable, ordered, at-most-once user-to-user
//! messaging channel the engine does not own — it is shared, supplied by the
//! application, and outlives any single engine. The engine's only
//! obligations to it are `send_message` (outbound) and registering a
//! callback for `subscribe_message_receive` (inbound).

use async_trait::async_trait;

/// Invoked with the raw payload string of every message addressed to this
/// engine's user id.
pub type MessageReceiveHandler = Box<dyn Fn(String) + Send + Sync>;

/// Abstract signaling transport consumed by the call engine.
///
/// Grounded on `connection::call_connection::CallConnection`, generalized from a
/// concrete `mpsc`-channel-backed struct to a trait so the engine can be
/// driven by any reliable messaging transport the application supplies.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Sends `payload` to `user_id`. Failure surfaces to the engine as
    /// `callError(Message, ...)`; the underlying error type is left to
    /// the implementation and wrapped in `anyhow::Error`.
    async fn send_message(&self, user_id: &str, payload: &str) -> anyhow::Result<()>;

    /// Registers `handler` to be invoked with the payload of every inbound
    /// message. Transports that support only one subscriber may replace any
    /// previously registered handler; the engine registers exactly one.
    fn subscribe_message_receive(&self, handler: MessageReceiveHandler);
}
