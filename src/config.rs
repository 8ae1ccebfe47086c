//! Engine and per-call configuration.
//!
//! [`CallEngineConfig`] holds the handful of parameters that are fixed for
//! the lifetime of an engine (the local user id, the media app id).
//! [`PrepareConfig`] is the sticky, per-call-session configuration mutated
//! only through [`crate::engine::CallEngine::prepare_for_call`]:
//! every field carries over to the next call unless the caller's
//! [`PrepareConfigUpdate`] explicitly overrides it.

use crate::logging::Redacted;
use crate::media::Surface;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Whether an outgoing or incoming invite is for an audio or a video call.
///
/// Both variants drive the identical state machine; they differ only
/// in which local tracks `rtc_join_and_publish` creates and in whether the
/// first-frame gate in `check_append_view` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Audio,
    Video,
}

impl Default for CallType {
    fn default() -> Self {
        CallType::Video
    }
}

/// Video capture/encode preferences handed to the media client when
/// creating the local video track. Left intentionally coarse — codec
/// negotiation is explicitly out of scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bitrate_kbps: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            width: 640,
            height: 480,
            frame_rate: 15,
            bitrate_kbps: 500,
        }
    }
}

/// Audio capture/encode preferences handed to the media client when
/// creating the local audio track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConfig {
    pub sample_rate_hz: u32,
    pub channels: u8,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            sample_rate_hz: 48_000,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
        }
    }
}

/// Engine-wide parameters fixed at construction time, as opposed to the
/// per-call, sticky [`PrepareConfig`].
#[derive(Debug, Clone)]
pub struct CallEngineConfig {
    /// This engine's own user id, stamped as `from_user_id` on every outbound
    /// [`crate::message::CallMessage`].
    pub user_id: String,
    /// App id passed through to `MediaClient::join`.
    pub app_id: String,
}

/// Sticky, per-call-session configuration.
///
/// Constructed via [`PrepareConfig::default`] plus [`PrepareConfig::merge`],
/// which is how [`crate::engine::CallEngine::prepare_for_call`] applies a
/// caller-supplied [`PrepareConfigUpdate`].
#[derive(Clone)]
pub struct PrepareConfig {
    pub room_id: String,
    pub rtc_token: Redacted<String>,
    pub local_view: Option<Arc<dyn Surface>>,
    pub remote_view: Option<Arc<dyn Surface>>,
    pub auto_accept: bool,
    pub call_timeout: Duration,
    pub first_frame_waiting_disabled: bool,
    pub video_config: VideoConfig,
    pub audio_config: AudioConfig,
}

impl fmt::Debug for PrepareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrepareConfig")
            .field("room_id", &self.room_id)
            .field("rtc_token", &self.rtc_token)
            .field("local_view", &self.local_view.as_ref().map(|_| "<surface>"))
            .field("remote_view", &self.remote_view.as_ref().map(|_| "<surface>"))
            .field("auto_accept", &self.auto_accept)
            .field("call_timeout", &self.call_timeout)
            .field(
                "first_frame_waiting_disabled",
                &self.first_frame_waiting_disabled,
            )
            .field("video_config", &self.video_config)
            .field("audio_config", &self.audio_config)
            .finish()
    }
}

impl Default for PrepareConfig {
    fn default() -> Self {
        PrepareConfig {
            room_id: String::new(),
            rtc_token: Redacted::new(String::new()),
            local_view: None,
            remote_view: None,
            auto_accept: false,
            call_timeout: Duration::from_secs(45),
            first_frame_waiting_disabled: false,
            video_config: VideoConfig::default(),
            audio_config: AudioConfig::default(),
        }
    }
}

impl PrepareConfig {
    /// Applies `update` over `self`, field by field, leaving unset fields
    /// untouched. This is the merge-over-existing semantics `prepare_for_call`
    /// requires.
    pub fn merge(&mut self, update: PrepareConfigUpdate) {
        if let Some(room_id) = update.room_id {
            self.room_id = room_id;
        }
        if let Some(rtc_token) = update.rtc_token {
            self.rtc_token = Redacted::new(rtc_token);
        }
        if let Some(local_view) = update.local_view {
            self.local_view = Some(local_view);
        }
        if let Some(remote_view) = update.remote_view {
            self.remote_view = Some(remote_view);
        }
        if let Some(auto_accept) = update.auto_accept {
            self.auto_accept = auto_accept;
        }
        if let Some(call_timeout) = update.call_timeout {
            self.call_timeout = call_timeout;
        }
        if let Some(disabled) = update.first_frame_waiting_disabled {
            self.first_frame_waiting_disabled = disabled;
        }
        if let Some(video_config) = update.video_config {
            self.video_config = video_config;
        }
        if let Some(audio_config) = update.audio_config {
            self.audio_config = audio_config;
        }
    }
}

/// A partial [`PrepareConfig`] update, as passed to `prepare_for_call`.
///
/// # Examples
///
/// ```
/// use callkit_rs::config::{PrepareConfig, PrepareConfigUpdate};
///
/// let mut config = PrepareConfig::default();
/// config.merge(PrepareConfigUpdate {
///     room_id: Some("room-42".to_string()),
///     auto_accept: Some(true),
///     ..Default::default()
/// });
///
/// assert_eq!(config.room_id, "room-42");
/// assert!(config.auto_accept);
/// ```
#[derive(Default)]
pub struct PrepareConfigUpdate {
    pub room_id: Option<String>,
    pub rtc_token: Option<String>,
    pub local_view: Option<Arc<dyn Surface>>,
    pub remote_view: Option<Arc<dyn Surface>>,
    pub auto_accept: Option<bool>,
    pub call_timeout: Option<Duration>,
    pub first_frame_waiting_disabled: Option<bool>,
    pub video_config: Option<VideoConfig>,
    pub audio_config: Option<AudioConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overrides_supplied_fields() {
        let mut config = PrepareConfig::default();
        config.room_id = "original-room".to_string();
        config.auto_accept = false;

        config.merge(PrepareConfigUpdate {
            auto_accept: Some(true),
            ..Default::default()
        });

        assert_eq!(config.room_id, "original-room");
        assert!(config.auto_accept);
    }

    #[test]
    fn debug_never_prints_the_token() {
        let mut config = PrepareConfig::default();
        config.rtc_token = Redacted::new("very-secret".to_string());
        let printed = format!("{config:?}");
        assert!(!printed.contains("very-secret"));
    }
}
