//! The application-facing command surface: `prepare_for_call`,
//! `call`, `cancel_call`, `accept`, `reject`, `hangup`, `destroy`.
//!
//! Each command acquires the lock fresh for every synchronous segment and
//! never holds it across an awaited adapter call — the lock is
//! reacquired after `tokio::join!`/`.await` points, not held through them.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::call_info::Milestone;
use crate::config::{CallType, PrepareConfigUpdate};
use crate::error::{CallEngineError, ErrorKind};
use crate::media::Track;
use crate::message::{CallMessage, MessageAction, Origin};
use crate::transport::SignalingTransport;

use super::inner::Inner;
use super::state::{CallState, Event, EventInfo, StateReason};
use super::view;

pub(super) async fn prepare_for_call(
    inner: &Arc<Mutex<Inner>>,
    update: PrepareConfigUpdate,
) -> Result<(), CallEngineError> {
    let mut guard = inner.lock().await;
    if guard.state.is_busy() {
        let state = guard.state;
        guard.emit_event(Event::StateMismatch("prepare_for_call"));
        return Err(CallEngineError::StateMismatch {
            command: "prepare_for_call",
            state,
        });
    }
    guard.config.merge(update);
    guard.transition(CallState::Prepared, StateReason::None, EventInfo::default());
    Ok(())
}

pub(super) async fn call(
    inner: &Arc<Mutex<Inner>>,
    remote_user_id: String,
    call_type: CallType,
) -> Result<(), CallEngineError> {
    let (room_id, rtc_token, app_id, user_id, call_id, transport) = {
        let mut guard = inner.lock().await;
        if guard.state != CallState::Prepared {
            let state = guard.state;
            guard.emit_event(Event::StateMismatch("call"));
            return Err(CallEngineError::StateMismatch {
                command: "call",
                state,
            });
        }

        guard.call_info.start();
        guard.remote_user_id = Some(remote_user_id.clone());
        guard.call_type = call_type;

        let reason = match call_type {
            CallType::Video => StateReason::LocalVideoCall,
            CallType::Audio => StateReason::LocalAudioCall,
        };
        let from_user_id = guard.engine_config.user_id.clone();
        guard.transition(
            CallState::Calling,
            reason,
            EventInfo {
                remote_user_id: Some(remote_user_id.clone()),
                from_user_id: Some(from_user_id),
                ..Default::default()
            },
        );
        guard.emit_event(Event::OnCalling);

        let call_id = uuid::Uuid::new_v4().to_string();
        guard.codec.assign_call_id(call_id.clone());

        let call_timeout = guard.config.call_timeout;
        super::timer::arm(inner.clone(), &mut guard, call_timeout, true);

        (
            guard.config.room_id.clone(),
            guard.config.rtc_token.as_inner().clone(),
            guard.engine_config.app_id.clone(),
            guard.engine_config.user_id.clone(),
            call_id,
            guard.transport.clone(),
        )
    };

    let message = CallMessage::new(
        call_id,
        user_id,
        remote_user_id.clone(),
        match call_type {
            CallType::Video => MessageAction::VideoCall,
            CallType::Audio => MessageAction::AudioCall,
        },
    )
    .with_room_id(room_id.clone());

    let (join_result, send_result) = tokio::join!(
        rtc_join_and_publish(inner, &app_id, &room_id, &rtc_token, &user_id, call_type),
        send_and_log(inner, &transport, &remote_user_id, message),
    );

    join_result?;
    send_result?;

    let mut guard = inner.lock().await;
    guard.record_milestone(Milestone::RemoteUserRecvCall);
    guard.emit_event(Event::RemoteUserRecvCall);
    Ok(())
}

pub(super) async fn cancel_call(inner: &Arc<Mutex<Inner>>) -> Result<(), CallEngineError> {
    let (remote_user_id, user_id, call_id, transport) = {
        let mut guard = inner.lock().await;
        let remote_user_id = guard.remote_user_id.clone().unwrap_or_default();
        let user_id = guard.engine_config.user_id.clone();
        let call_id = guard.call_id().unwrap_or_default();
        let transport = guard.transport.clone();
        guard.transition(CallState::Prepared, StateReason::LocalCancel, EventInfo::default());
        guard.emit_event(Event::LocalCancelled);
        (remote_user_id, user_id, call_id, transport)
    };

    let message = CallMessage::new(call_id, user_id, remote_user_id.clone(), MessageAction::Cancel)
        .with_cancel_origin(Origin::External);

    let (_, teardown_result) = tokio::join!(
        send_and_log(inner, &transport, &remote_user_id, message),
        teardown(inner),
    );
    teardown_result
}

pub(super) async fn accept(
    inner: &Arc<Mutex<Inner>>,
    remote_user_id: String,
) -> Result<(), CallEngineError> {
    let (user_id, call_id, transport) = {
        let mut guard = inner.lock().await;
        if guard.state != CallState::Calling {
            let state = guard.state;
            guard.emit_event(Event::StateMismatch("accept"));
            return Err(CallEngineError::StateMismatch {
                command: "accept",
                state,
            });
        }
        guard.emit_event(Event::LocalAccepted);
        guard.record_milestone(Milestone::AcceptCall);
        guard.transition(CallState::Connecting, StateReason::LocalAccepted, EventInfo::default());
        view::check_append_view(&mut guard);

        let user_id = guard.engine_config.user_id.clone();
        let call_id = guard.call_id().unwrap_or_default();
        let transport = guard.transport.clone();
        (user_id, call_id, transport)
    };

    let message = CallMessage::new(call_id, user_id, remote_user_id.clone(), MessageAction::Accept);
    send_and_log(inner, &transport, &remote_user_id, message).await
}

pub(super) async fn reject(
    inner: &Arc<Mutex<Inner>>,
    remote_user_id: String,
    reason: String,
) -> Result<(), CallEngineError> {
    let (user_id, call_id, transport) = {
        let mut guard = inner.lock().await;
        let user_id = guard.engine_config.user_id.clone();
        let call_id = guard.call_id().unwrap_or_default();
        let transport = guard.transport.clone();
        guard.transition(CallState::Prepared, StateReason::LocalRejected, EventInfo::default());
        guard.emit_event(Event::LocalRejected);
        (user_id, call_id, transport)
    };

    let message = CallMessage::new(call_id, user_id, remote_user_id.clone(), MessageAction::Reject)
        .with_reject_reason(reason)
        .with_reject_origin(Origin::External);

    let (send_result, teardown_result) = tokio::join!(
        send_and_log(inner, &transport, &remote_user_id, message),
        teardown(inner),
    );
    send_result?;
    teardown_result
}

pub(super) async fn hangup(
    inner: &Arc<Mutex<Inner>>,
    remote_user_id: String,
) -> Result<(), CallEngineError> {
    let (user_id, call_id, transport) = {
        let mut guard = inner.lock().await;
        let user_id = guard.engine_config.user_id.clone();
        let call_id = guard.call_id().unwrap_or_default();
        let transport = guard.transport.clone();
        guard.transition(CallState::Prepared, StateReason::LocalHangup, EventInfo::default());
        guard.emit_event(Event::LocalHangup);
        (user_id, call_id, transport)
    };

    let message = CallMessage::new(call_id, user_id, remote_user_id.clone(), MessageAction::Hangup);

    let (send_result, teardown_result) = tokio::join!(
        send_and_log(inner, &transport, &remote_user_id, message),
        teardown(inner),
    );
    send_result?;
    teardown_result
}

pub(super) async fn destroy(inner: &Arc<Mutex<Inner>>) -> Result<(), CallEngineError> {
    teardown(inner).await
}

/// Encodes and sends `message`, mapping any failure to `callError(Message,
/// ...)` and a [`CallEngineError::Transport`].
async fn send_and_log(
    inner: &Arc<Mutex<Inner>>,
    transport: &Arc<dyn SignalingTransport>,
    to: &str,
    message: CallMessage,
) -> Result<(), CallEngineError> {
    let encoded = {
        let guard = inner.lock().await;
        guard.codec.encode(message)
    };
    let payload = match encoded {
        Ok(payload) => payload,
        Err(err) => {
            let mut guard = inner.lock().await;
            guard.emit_error(ErrorKind::Message, err.to_string());
            return Err(CallEngineError::Transport(err));
        }
    };

    if let Err(err) = transport.send_message(to, &payload).await {
        let mut guard = inner.lock().await;
        guard.emit_error(ErrorKind::Message, err.to_string());
        return Err(CallEngineError::Transport(err));
    }
    Ok(())
}

/// Runs track creation and channel join concurrently, then publishes both
/// tracks once both resolve. An audio-only call never requests a
/// video track.
pub(super) async fn rtc_join_and_publish(
    inner: &Arc<Mutex<Inner>>,
    app_id: &str,
    room_id: &str,
    rtc_token: &str,
    user_id: &str,
    call_type: CallType,
) -> Result<(), CallEngineError> {
    let media = {
        let mut guard = inner.lock().await;
        guard.emit_event(Event::JoinRtcStart);
        guard.media.clone()
    };

    let want_video = call_type == CallType::Video;
    let (tracks_result, join_result) = tokio::join!(
        media.create_local_tracks(want_video, true),
        media.join(app_id, room_id, rtc_token, user_id),
    );

    let (local_video, local_audio) = match tracks_result {
        Ok(tracks) => tracks,
        Err(err) => {
            let mut guard = inner.lock().await;
            guard.emit_error(ErrorKind::Rtc, err.to_string());
            return Err(CallEngineError::Media(err));
        }
    };
    if let Err(err) = join_result {
        let mut guard = inner.lock().await;
        guard.emit_error(ErrorKind::Rtc, err.to_string());
        return Err(CallEngineError::Media(err));
    }

    let local_view = {
        let mut guard = inner.lock().await;
        guard.rtc_joined = true;
        guard.local_video_track = local_video.clone();
        guard.local_audio_track = local_audio.clone();
        guard.record_milestone(Milestone::LocalUserJoinChannel);
        guard.emit_event(Event::JoinRtcSucceeded);
        guard.emit_event(Event::LocalJoined);
        guard.config.local_view.clone()
    };

    if let (Some(video), Some(surface)) = (&local_video, &local_view) {
        let _ = video.play(surface.as_ref()).await;
    }

    let published_video = local_video.is_some();
    let mut tracks_to_publish: Vec<Arc<dyn Track>> = Vec::new();
    if let Some(video) = local_video {
        tracks_to_publish.push(video);
    }
    if let Some(audio) = local_audio {
        tracks_to_publish.push(audio);
    }

    if let Err(err) = media.publish(tracks_to_publish).await {
        let mut guard = inner.lock().await;
        guard.emit_error(ErrorKind::Rtc, err.to_string());
        return Err(CallEngineError::Media(err));
    }

    if published_video {
        let guard = inner.lock().await;
        guard.emit_event(Event::PublishFirstLocalVideoFrame);
    }

    Ok(())
}

/// Stops remote audio, closes every local/remote track, leaves the media
/// channel if joined (emitting `LocalLeft`), and resets per-call state.
/// Idempotent: calling this with nothing to tear down is a no-op beyond the
/// state reset.
pub(super) async fn teardown(inner: &Arc<Mutex<Inner>>) -> Result<(), CallEngineError> {
    let (remote_audio, remote_video, local_audio, local_video, rtc_joined, media) = {
        let mut guard = inner.lock().await;
        (
            guard.remote_audio_track.take(),
            guard.remote_video_track.take(),
            guard.local_audio_track.take(),
            guard.local_video_track.take(),
            guard.rtc_joined,
            guard.media.clone(),
        )
    };

    if let Some(track) = &remote_audio {
        track.stop();
        track.close();
    }
    if let Some(track) = &remote_video {
        track.close();
    }
    if let Some(track) = &local_audio {
        track.close();
    }
    if let Some(track) = &local_video {
        track.close();
    }

    let leave_result = if rtc_joined { media.leave().await } else { Ok(()) };

    let mut guard = inner.lock().await;
    guard.reset_call_state();
    let finished = guard.call_info.finish();
    guard.info_emitter.emit(&finished);

    match leave_result {
        Ok(()) => {
            if rtc_joined {
                guard.emit_event(Event::LocalLeft);
            }
            Ok(())
        }
        Err(err) => {
            guard.emit_error(ErrorKind::Rtc, err.to_string());
            Err(CallEngineError::Media(err))
        }
    }
}
