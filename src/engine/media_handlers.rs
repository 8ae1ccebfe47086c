//! Media-plane event handlers. Registered once, at construction,
//! against [`crate::media::MediaClient::subscribe_events`]; every handler
//! short-circuits when the event's `uid` is not the committed remote peer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::call_info::Milestone;
use crate::error::ErrorKind;
use crate::media::{MediaClientEvent, MediaKind};

use super::inner::Inner;
use super::state::{CallState, Event, EventInfo, StateReason};
use super::view;

pub(super) async fn handle_media_event(inner: &Arc<Mutex<Inner>>, event: MediaClientEvent) {
    match event {
        MediaClientEvent::UserJoined { uid } => handle_user_joined(inner, uid).await,
        MediaClientEvent::UserLeft { uid } => handle_user_left(inner, uid).await,
        MediaClientEvent::UserPublished { uid, kind } => handle_user_published(inner, uid, kind).await,
        MediaClientEvent::UserUnpublished { uid, kind } => {
            handle_user_unpublished(inner, uid, kind).await
        }
    }
}

async fn handle_user_joined(inner: &Arc<Mutex<Inner>>, uid: String) {
    let mut guard = inner.lock().await;
    if guard.remote_user_id.as_deref() != Some(uid.as_str()) {
        return;
    }
    guard.record_milestone(Milestone::RemoteUserJoinChannel);
    guard.emit_event(Event::RemoteJoined);
}

async fn handle_user_left(inner: &Arc<Mutex<Inner>>, uid: String) {
    let still_busy = {
        let guard = inner.lock().await;
        if guard.remote_user_id.as_deref() != Some(uid.as_str()) {
            return;
        }
        guard.emit_event(Event::RemoteLeft);
        guard.state.is_busy()
    };

    if still_busy {
        let _ = super::commands::teardown(inner).await;
        let mut guard = inner.lock().await;
        guard.transition(CallState::Prepared, StateReason::RemoteHangup, EventInfo::default());
    }
}

async fn handle_user_published(inner: &Arc<Mutex<Inner>>, uid: String, kind: MediaKind) {
    let (media, matches) = {
        let guard = inner.lock().await;
        (
            guard.media.clone(),
            guard.remote_user_id.as_deref() == Some(uid.as_str()),
        )
    };
    if !matches {
        return;
    }

    let track = match media.subscribe(&uid, kind).await {
        Ok(track) => track,
        Err(err) => {
            let mut guard = inner.lock().await;
            guard.emit_error(ErrorKind::Rtc, err.to_string());
            return;
        }
    };

    match kind {
        MediaKind::Video => {
            let inner_for_callback = inner.clone();
            track.subscribe_first_frame_decoded(Box::new(move || {
                let inner = inner_for_callback.clone();
                tokio::spawn(async move {
                    handle_first_frame_decoded(&inner).await;
                });
            }));

            let (already_connected, remote_view) = {
                let mut guard = inner.lock().await;
                guard.remote_video_track = Some(track.clone());
                let already_connected = guard.state == CallState::Connected;
                view::check_append_view(&mut guard);
                (already_connected, guard.config.remote_view.clone())
            };
            // Connected was already latched before this track arrived (e.g.
            // first_frame_waiting_disabled) — check_append_view won't fire
            // again, so play it directly.
            if already_connected && !track.is_playing() {
                if let Some(surface) = remote_view {
                    let _ = track.play(surface.as_ref()).await;
                }
            }
        }
        MediaKind::Audio => {
            let (already_connected, remote_view) = {
                let mut guard = inner.lock().await;
                guard.remote_audio_track = Some(track.clone());
                (
                    guard.state == CallState::Connected,
                    guard.config.remote_view.clone(),
                )
            };
            if already_connected {
                if let Some(surface) = remote_view {
                    let _ = track.play(surface.as_ref()).await;
                }
            }
        }
    }
}

async fn handle_user_unpublished(inner: &Arc<Mutex<Inner>>, uid: String, kind: MediaKind) {
    let (media, matches) = {
        let guard = inner.lock().await;
        (
            guard.media.clone(),
            guard.remote_user_id.as_deref() == Some(uid.as_str()),
        )
    };
    if !matches {
        return;
    }

    if let Err(err) = media.unsubscribe(&uid, kind).await {
        let mut guard = inner.lock().await;
        guard.emit_error(ErrorKind::Rtc, err.to_string());
    }

    let mut guard = inner.lock().await;
    match kind {
        MediaKind::Video => guard.remote_video_track = None,
        MediaKind::Audio => guard.remote_audio_track = None,
    }
}

async fn handle_first_frame_decoded(inner: &Arc<Mutex<Inner>>) {
    let mut guard = inner.lock().await;
    guard.record_milestone(Milestone::RecvFirstFrame);
    guard.received_remote_first_frame_decoded = true;
    guard.emit_event(Event::RecvRemoteFirstFrame);
    guard.emit_info_snapshot();
    view::check_append_view(&mut guard);
}
