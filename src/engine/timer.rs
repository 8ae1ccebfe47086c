//! The auto-cancel timeout timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::message::{CallMessage, MessageAction, Origin};

use super::inner::Inner;
use super::state::{CallState, Event, EventInfo, StateReason};

/// Spawns the timeout task for the call currently owned by `inner`.
/// Re-arming (disarming the previous handle and storing this one in
/// `Inner::timer_handle`) is the caller's responsibility, done while still
/// holding the guard that set up the new call.
pub(super) fn spawn_timeout(
    inner: Arc<Mutex<Inner>>,
    timeout: Duration,
    is_local_originated: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        fire(&inner, is_local_originated).await;
    })
}

/// Arms a fresh timer for this call, disarming whatever was previously
/// armed. Convenience wrapper over [`spawn_timeout`] for call sites that
/// already hold the guard.
pub(super) fn arm(inner: Arc<Mutex<Inner>>, guard: &mut Inner, timeout: Duration, is_local_originated: bool) {
    guard.disarm_timer();
    let handle = spawn_timeout(inner, timeout, is_local_originated);
    guard.timer_handle = Some(handle);
}

async fn fire(inner: &Arc<Mutex<Inner>>, is_local_originated: bool) {
    let (remote_user_id, user_id, call_id, transport) = {
        let mut guard = inner.lock().await;
        if !matches!(guard.state, CallState::Calling | CallState::Connecting) {
            return;
        }
        let remote_user_id = guard.remote_user_id.clone().unwrap_or_default();
        let user_id = guard.engine_config.user_id.clone();
        let call_id = guard.call_id().unwrap_or_default();
        let transport = guard.transport.clone();

        guard.transition(CallState::Prepared, StateReason::CallingTimeout, EventInfo::default());
        guard.emit_event(if is_local_originated {
            Event::CallingTimeout
        } else {
            Event::RemoteCallingTimeout
        });
        (remote_user_id, user_id, call_id, transport)
    };

    let message = CallMessage::new(call_id, user_id, remote_user_id.clone(), MessageAction::Cancel)
        .with_cancel_origin(Origin::Internal);

    let encoded = {
        let guard = inner.lock().await;
        guard.codec.encode(message)
    };

    let send_fut = async {
        if let Ok(payload) = encoded {
            let _ = transport.send_message(&remote_user_id, &payload).await;
        }
    };
    let teardown_fut = super::commands::teardown(inner);

    let (_, teardown_result) = tokio::join!(send_fut, teardown_fut);
    if let Err(err) = teardown_result {
        log::warn!("timer teardown after expiry failed: {err}");
    }
}
