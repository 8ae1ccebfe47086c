//! The call engine: a public facade (`CallEngine`) wrapping the
//! `Arc<tokio::sync::Mutex<Inner>>` that all command handlers, inbound
//! signaling handlers, media handlers, and the timeout timer share.
//!
//! Grounded on the `SipManager`/`InnerSipManager` split: a small
//! public handle holding shared state, with the actual work living in
//! sibling modules that take a reference to that shared state rather than
//! `self`.

pub mod state;

mod commands;
mod inner;
mod media_handlers;
mod signaling;
mod timer;
mod view;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{CallEngineConfig, CallType, PrepareConfigUpdate};
use crate::error::{CallEngineError, CallErrorEvent};
use crate::media::{MediaClient, MediaClientEvent};
use crate::transport::SignalingTransport;

use inner::Inner;
use state::{Event, StateChange};

/// The 1-to-1 call signaling and media orchestration engine.
///
/// One `CallEngine` drives one local user's participation across
/// successive calls. Cheaply cloneable: clones share the same underlying
/// state.
///
/// # Examples
///
/// ```no_run
/// use callkit_rs::config::{CallEngineConfig, PrepareConfigUpdate};
/// use callkit_rs::engine::CallEngine;
/// # async fn run(transport: std::sync::Arc<dyn callkit_rs::transport::SignalingTransport>,
/// #              media: std::sync::Arc<dyn callkit_rs::media::MediaClient>) -> anyhow::Result<()> {
/// let engine = CallEngine::new(
///     CallEngineConfig { user_id: "alice".into(), app_id: "app-1".into() },
///     transport,
///     media,
/// );
/// engine.prepare_for_call(PrepareConfigUpdate::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CallEngine {
    inner: Arc<Mutex<Inner>>,
}

impl CallEngine {
    /// Constructs an engine around the given transport and media adapters,
    /// registering its inbound-signal and media-event handlers.
    pub fn new(
        engine_config: CallEngineConfig,
        transport: Arc<dyn SignalingTransport>,
        media: Arc<dyn MediaClient>,
    ) -> Self {
        let inner = Arc::new(Mutex::new(Inner::new(
            engine_config,
            transport.clone(),
            media.clone(),
        )));

        let signaling_inner = inner.clone();
        transport.subscribe_message_receive(Box::new(move |payload| {
            let inner = signaling_inner.clone();
            tokio::spawn(async move {
                signaling::handle_inbound_message(&inner, payload).await;
            });
        }));

        let media_inner = inner.clone();
        media.subscribe_events(Box::new(move |event: MediaClientEvent| {
            let inner = media_inner.clone();
            tokio::spawn(async move {
                media_handlers::handle_media_event(&inner, event).await;
            });
        }));

        CallEngine { inner }
    }

    /// Sets the maximum level the `log` facade will forward for this
    /// process. Affects every component in this crate, since they all log
    /// through the same facade.
    pub fn set_log_level(&self, level: log::LevelFilter) {
        log::set_max_level(level);
    }

    /// Returns the current call's id, or `None` outside `Calling`/
    /// `Connecting`/`Connected`.
    pub async fn get_call_id(&self) -> Option<String> {
        self.inner.lock().await.call_id()
    }

    /// Merges `update` over the sticky per-call configuration and
    /// transitions to `Prepared`. Fails with `StateMismatch` while busy.
    pub async fn prepare_for_call(&self, update: PrepareConfigUpdate) -> Result<(), CallEngineError> {
        commands::prepare_for_call(&self.inner, update).await
    }

    /// Originates a call to `remote_user_id`. Fails with `StateMismatch`
    /// outside `Prepared`.
    pub async fn call(
        &self,
        remote_user_id: impl Into<String>,
        call_type: CallType,
    ) -> Result<(), CallEngineError> {
        commands::call(&self.inner, remote_user_id.into(), call_type).await
    }

    /// Cancels the call this engine originated. Callable any time after
    /// `call()`; no state precondition.
    pub async fn cancel_call(&self) -> Result<(), CallEngineError> {
        commands::cancel_call(&self.inner).await
    }

    /// Accepts the pending invite from `remote_user_id`. Fails with
    /// `StateMismatch` outside `Calling`.
    pub async fn accept(&self, remote_user_id: impl Into<String>) -> Result<(), CallEngineError> {
        commands::accept(&self.inner, remote_user_id.into()).await
    }

    /// Rejects the pending invite from `remote_user_id` with `reason`.
    pub async fn reject(
        &self,
        remote_user_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<(), CallEngineError> {
        commands::reject(&self.inner, remote_user_id.into(), reason.into()).await
    }

    /// Hangs up on `remote_user_id`, ending an in-progress call.
    pub async fn hangup(&self, remote_user_id: impl Into<String>) -> Result<(), CallEngineError> {
        commands::hangup(&self.inner, remote_user_id.into()).await
    }

    /// Tears down all media resources unconditionally. Idempotent.
    pub async fn destroy(&self) -> Result<(), CallEngineError> {
        commands::destroy(&self.inner).await
    }

    /// Subscribes to `callStateChanged` observations, returning a handle
    /// that can be passed to [`CallEngine::unsubscribe_state_changed`].
    pub async fn subscribe_state_changed<F>(&self, handler: F) -> usize
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.inner.lock().await.state_emitter.subscribe(handler)
    }

    pub async fn unsubscribe_state_changed(&self, handle: usize) {
        self.inner.lock().await.state_emitter.unsubscribe(handle);
    }

    /// Subscribes to `callEventChanged` observations.
    pub async fn subscribe_event_changed<F>(&self, handler: F) -> usize
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.lock().await.event_emitter.subscribe(handler)
    }

    pub async fn unsubscribe_event_changed(&self, handle: usize) {
        self.inner.lock().await.event_emitter.unsubscribe(handle);
    }

    /// Subscribes to `callError` observations.
    pub async fn subscribe_error<F>(&self, handler: F) -> usize
    where
        F: Fn(&CallErrorEvent) + Send + Sync + 'static,
    {
        self.inner.lock().await.error_emitter.subscribe(handler)
    }

    pub async fn unsubscribe_error(&self, handle: usize) {
        self.inner.lock().await.error_emitter.unsubscribe(handle);
    }

    /// Subscribes to `callInfoChanged` observations (per-call milestone
    /// snapshots).
    pub async fn subscribe_info_changed<F>(&self, handler: F) -> usize
    where
        F: Fn(&Vec<crate::call_info::MilestoneEntry>) + Send + Sync + 'static,
    {
        self.inner.lock().await.info_emitter.subscribe(handler)
    }

    pub async fn unsubscribe_info_changed(&self, handle: usize) {
        self.inner.lock().await.info_emitter.unsubscribe(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrepareConfigUpdate;
    use crate::testing::{FakeMediaClient, FakeSignalingTransport};

    fn engine(user_id: &str, app_id: &str) -> CallEngine {
        let transport: Arc<dyn SignalingTransport> = Arc::new(FakeSignalingTransport::new());
        let media: Arc<dyn MediaClient> = Arc::new(FakeMediaClient::new());
        CallEngine::new(
            CallEngineConfig {
                user_id: user_id.to_string(),
                app_id: app_id.to_string(),
            },
            transport,
            media,
        )
    }

    #[tokio::test]
    async fn call_before_prepare_is_state_mismatch() {
        let engine = engine("alice", "app");
        let err = engine.call("bob", CallType::Video).await.unwrap_err();
        assert!(matches!(err, CallEngineError::StateMismatch { command: "call", .. }));
    }

    #[tokio::test]
    async fn prepare_for_call_reaches_prepared() {
        let engine = engine("alice", "app");
        engine
            .prepare_for_call(PrepareConfigUpdate::default())
            .await
            .unwrap();
        assert_eq!(engine.get_call_id().await, None);
    }
}
