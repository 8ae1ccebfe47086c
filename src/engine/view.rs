//! The view-attach rendezvous: the single place that latches state
//! `Connected`.

use super::inner::Inner;
use super::state::{CallState, EventInfo, StateReason};
use crate::call_info::Milestone;
use crate::config::CallType;

/// Called from two independent sources — the accept path (right after the
/// state enters `Connecting`) and the remote-video first-frame callback.
/// Both call this; at most one of them performs the transition, because step
/// 1 neuters every call after the first.
pub(super) fn check_append_view(inner: &mut Inner) {
    if inner.state != CallState::Connecting {
        return;
    }

    let first_frame_ready = inner.config.first_frame_waiting_disabled
        || inner.received_remote_first_frame_decoded
        || inner.call_type == CallType::Audio;
    if !first_frame_ready {
        return;
    }

    inner.transition(
        CallState::Connected,
        StateReason::RecvRemoteFirstFrame,
        EventInfo::default(),
    );

    if let (Some(local_video), Some(local_view)) =
        (&inner.local_video_track, &inner.config.local_view)
    {
        if !local_video.is_playing() {
            local_view.clear();
            local_view.mount();
            spawn_play(local_video.clone(), local_view.clone());
        }
    }

    if let (Some(remote_video), Some(remote_view)) =
        (&inner.remote_video_track, &inner.config.remote_view)
    {
        if !remote_video.is_playing() {
            remote_view.clear();
            remote_view.mount();
            spawn_play(remote_video.clone(), remote_view.clone());
        }
    }

    if let Some(remote_audio) = &inner.remote_audio_track {
        if !remote_audio.is_playing() {
            if let Some(remote_view) = &inner.config.remote_view {
                spawn_play(remote_audio.clone(), remote_view.clone());
            }
        }
    }

    if inner.call_type == CallType::Audio && !inner.call_info.has(Milestone::RecvFirstFrame) {
        inner.record_milestone(Milestone::RecvFirstFrame);
    }
}

fn spawn_play(track: std::sync::Arc<dyn crate::media::Track>, surface: std::sync::Arc<dyn crate::media::Surface>) {
    tokio::spawn(async move {
        let _ = track.play(surface.as_ref()).await;
    });
}
