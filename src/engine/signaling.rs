//! Inbound signaling handlers: decodes the wire payload and dispatches
//! on `action`. Registered once, at construction, against
//! [`crate::transport::SignalingTransport::subscribe_message_receive`].

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::call_info::Milestone;
use crate::config::CallType;
use crate::error::ErrorKind;
use crate::message::{CallMessage, MessageAction, Origin};
use crate::transport::SignalingTransport;

use super::inner::Inner;
use super::state::{CallState, Event, EventInfo, StateReason};
use super::view;

pub(super) async fn handle_inbound_message(inner: &Arc<Mutex<Inner>>, payload: String) {
    let message = {
        let guard = inner.lock().await;
        guard.codec.decode(&payload)
    };
    let message = match message {
        Ok(message) => message,
        Err(err) => {
            let mut guard = inner.lock().await;
            guard.emit_error(ErrorKind::Message, err.to_string());
            return;
        }
    };

    match message.action {
        MessageAction::VideoCall => handle_invite(inner, message, CallType::Video).await,
        MessageAction::AudioCall => handle_invite(inner, message, CallType::Audio).await,
        MessageAction::Accept => handle_accept(inner, message).await,
        MessageAction::Reject => handle_reject(inner, message).await,
        MessageAction::Cancel => handle_cancel(inner, message).await,
        MessageAction::Hangup => handle_hangup(inner, message).await,
    }
}

async fn handle_invite(inner: &Arc<Mutex<Inner>>, message: CallMessage, call_type: CallType) {
    let busy = {
        let guard = inner.lock().await;
        if guard.is_calling_user(&message.from_user_id) {
            None
        } else {
            Some((guard.transport.clone(), guard.engine_config.user_id.clone()))
        }
    };

    if let Some((transport, user_id)) = busy {
        let reject_msg = CallMessage::new(
            message.call_id.clone(),
            user_id,
            message.from_user_id.clone(),
            MessageAction::Reject,
        )
        .with_reject_reason("busy")
        .with_reject_origin(Origin::Internal);
        send_reply(inner, &transport, &message.from_user_id, reject_msg).await;
        return;
    }

    let auto_accept = {
        let mut guard = inner.lock().await;
        guard.call_info.start();
        guard.codec.hold_call_id(message.call_id.clone());
        guard.remote_user_id = Some(message.from_user_id.clone());
        guard.room_id = message.from_room_id.clone().unwrap_or_default();
        guard.call_type = call_type;

        let call_timeout = guard.config.call_timeout;
        super::timer::arm(inner.clone(), &mut guard, call_timeout, false);

        let reason = match call_type {
            CallType::Video => StateReason::RemoteVideoCall,
            CallType::Audio => StateReason::RemoteAudioCall,
        };
        guard.transition(
            CallState::Calling,
            reason,
            EventInfo {
                remote_user_id: Some(message.remote_user_id.clone()),
                from_user_id: Some(message.from_user_id.clone()),
                ..Default::default()
            },
        );
        guard.emit_event(Event::OnCalling);
        guard.config.auto_accept
    };

    let (app_id, room_id, rtc_token, user_id) = {
        let guard = inner.lock().await;
        (
            guard.engine_config.app_id.clone(),
            guard.room_id.clone(),
            guard.config.rtc_token.as_inner().clone(),
            guard.engine_config.user_id.clone(),
        )
    };

    let _ =
        super::commands::rtc_join_and_publish(inner, &app_id, &room_id, &rtc_token, &user_id, call_type)
            .await;

    // Dropped the lock before this recursive call on purpose: `accept` takes
    // its own lock, and this task never holds the guard across it.
    if auto_accept {
        let _ = super::commands::accept(inner, message.from_user_id.clone()).await;
    }
}

async fn handle_accept(inner: &Arc<Mutex<Inner>>, _message: CallMessage) {
    let mut guard = inner.lock().await;
    guard.record_milestone(Milestone::AcceptCall);
    guard.emit_event(Event::RemoteAccepted);
    guard.transition(
        CallState::Connecting,
        StateReason::RemoteAccepted,
        EventInfo::default(),
    );
    view::check_append_view(&mut guard);
}

async fn handle_reject(inner: &Arc<Mutex<Inner>>, message: CallMessage) {
    {
        let guard = inner.lock().await;
        if !guard.is_calling_user(&message.from_user_id) {
            return;
        }
    }

    let _ = super::commands::teardown(inner).await;

    let mut guard = inner.lock().await;
    let is_busy_reject = message.reject_by_internal == Some(Origin::Internal);
    let reason = if is_busy_reject {
        StateReason::RemoteCallBusy
    } else {
        StateReason::RemoteRejected
    };
    guard.transition(
        CallState::Prepared,
        reason,
        EventInfo {
            reject_reason: message.reject_reason.clone(),
            ..Default::default()
        },
    );
    guard.emit_event(if is_busy_reject {
        Event::RemoteCallBusy
    } else {
        Event::RemoteRejected
    });
}

async fn handle_cancel(inner: &Arc<Mutex<Inner>>, message: CallMessage) {
    let mut guard = inner.lock().await;
    if !guard.is_calling_user(&message.from_user_id) {
        return;
    }
    guard.transition(
        CallState::Prepared,
        StateReason::RemoteCancel,
        EventInfo {
            cancel_call_by_internal: message.cancel_call_by_internal,
            ..Default::default()
        },
    );
    guard.emit_event(Event::RemoteCancelled);
    drop(guard);
    let _ = super::commands::teardown(inner).await;
}

async fn handle_hangup(inner: &Arc<Mutex<Inner>>, message: CallMessage) {
    let mut guard = inner.lock().await;
    if !guard.is_calling_user(&message.from_user_id) {
        return;
    }
    guard.transition(CallState::Prepared, StateReason::RemoteHangup, EventInfo::default());
    guard.emit_event(Event::RemoteHangup);
    drop(guard);
    let _ = super::commands::teardown(inner).await;
}

async fn send_reply(
    inner: &Arc<Mutex<Inner>>,
    transport: &Arc<dyn SignalingTransport>,
    to: &str,
    message: CallMessage,
) {
    let encoded = {
        let guard = inner.lock().await;
        guard.codec.encode(message)
    };
    match encoded {
        Ok(payload) => {
            if let Err(err) = transport.send_message(to, &payload).await {
                let mut guard = inner.lock().await;
                guard.emit_error(ErrorKind::Message, err.to_string());
            }
        }
        Err(err) => {
            let mut guard = inner.lock().await;
            guard.emit_error(ErrorKind::Message, err.to_string());
        }
    }
}
