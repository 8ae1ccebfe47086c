//! The engine's mutable state, guarded by the `Arc<Mutex<_>>` in
//! [`super::CallEngine`], plus the small synchronous helpers every command
//! and handler builds on.

use crate::call_info::{CallInfo, Milestone};
use crate::config::{CallEngineConfig, PrepareConfig};
use crate::error::{CallErrorEvent, ErrorKind};
use crate::event_emitter::EventEmitter;
use crate::media::{MediaClient, Track};
use crate::message::codec::CallMessageCodec;
use crate::transport::SignalingTransport;

use super::state::{CallState, Event, EventInfo, StateChange, StateReason};
use crate::config::CallType;

use std::sync::Arc;
use tokio::task::JoinHandle;

/// All state the engine mutates, behind one mutex. The mutex is the
/// engine's only synchronization primitive, and every command acquires it
/// fresh for each synchronous segment of work rather than holding it across
/// a recursive call into another command (see `engine::signaling`'s
/// auto-accept path for the one place this matters).
pub struct Inner {
    pub engine_config: CallEngineConfig,
    pub config: PrepareConfig,

    pub transport: Arc<dyn SignalingTransport>,
    pub media: Arc<dyn MediaClient>,

    pub state: CallState,
    pub remote_user_id: Option<String>,
    pub room_id: String,
    pub call_type: CallType,

    pub codec: CallMessageCodec,
    pub call_info: CallInfo,

    pub rtc_joined: bool,
    pub local_audio_track: Option<Arc<dyn Track>>,
    pub local_video_track: Option<Arc<dyn Track>>,
    pub remote_audio_track: Option<Arc<dyn Track>>,
    pub remote_video_track: Option<Arc<dyn Track>>,
    pub received_remote_first_frame_decoded: bool,

    pub timer_handle: Option<JoinHandle<()>>,

    pub state_emitter: EventEmitter<StateChange>,
    pub event_emitter: EventEmitter<Event>,
    pub error_emitter: EventEmitter<CallErrorEvent>,
    pub info_emitter: EventEmitter<Vec<crate::call_info::MilestoneEntry>>,
}

impl Inner {
    pub fn new(
        engine_config: CallEngineConfig,
        transport: Arc<dyn SignalingTransport>,
        media: Arc<dyn MediaClient>,
    ) -> Self {
        Inner {
            engine_config,
            config: PrepareConfig::default(),
            transport,
            media,
            state: CallState::Idle,
            remote_user_id: None,
            room_id: String::new(),
            call_type: CallType::Video,
            codec: CallMessageCodec::new(),
            call_info: CallInfo::new(),
            rtc_joined: false,
            local_audio_track: None,
            local_video_track: None,
            remote_audio_track: None,
            remote_video_track: None,
            received_remote_first_frame_decoded: false,
            timer_handle: None,
            state_emitter: EventEmitter::new(),
            event_emitter: EventEmitter::new(),
            error_emitter: EventEmitter::new(),
            info_emitter: EventEmitter::new(),
        }
    }

    /// True if no peer is committed yet, or the
    /// committed peer is exactly `id`. Admits the first inbound invite and
    /// any later duplicate from the same peer (glare), rejects interlopers.
    pub fn is_calling_user(&self, id: &str) -> bool {
        match &self.remote_user_id {
            None => true,
            Some(current) => current == id,
        }
    }

    /// Transitions to `to` with `reason`/`info`, emitting `callStateChanged`
    /// — unless `to == self.state`, in which case this is a no-op and
    /// nothing is emitted.
    pub fn transition(&mut self, to: CallState, reason: StateReason, info: EventInfo) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        crate::logging::log_state_transition(from, to, reason);
        self.state_emitter.emit(&StateChange {
            from,
            to,
            reason,
            info,
        });
    }

    pub fn emit_event(&self, event: Event) {
        crate::logging::log_event(&event);
        self.event_emitter.emit(&event);
    }

    pub fn emit_error(&self, kind: ErrorKind, message: impl Into<String>) {
        let event = CallErrorEvent {
            kind,
            message: message.into(),
        };
        crate::logging::log_error(kind, &event.message);
        self.error_emitter.emit(&event);
    }

    pub fn emit_info_snapshot(&mut self) {
        let snapshot = self.call_info.snapshot();
        self.info_emitter.emit(&snapshot);
    }

    pub fn record_milestone(&mut self, milestone: Milestone) {
        self.call_info.record(milestone);
    }

    /// `call_id` is non-empty exactly when busy. Exposed to the public
    /// `get_call_id` command.
    pub fn call_id(&self) -> Option<String> {
        self.codec.call_id().map(|s| s.to_string())
    }

    /// Disarms the timeout/cancel timer if one is armed.
    pub fn disarm_timer(&mut self) {
        if let Some(handle) = self.timer_handle.take() {
            handle.abort();
        }
    }

    /// Clears all per-call state back to the `Prepared` resting point.
    /// Does not touch `state` itself — callers transition separately,
    /// before or after this.
    pub fn reset_call_state(&mut self) {
        self.disarm_timer();
        self.remote_user_id = None;
        self.room_id = String::new();
        self.codec.clear_call_id();
        self.rtc_joined = false;
        self.local_audio_track = None;
        self.local_video_track = None;
        self.remote_audio_track = None;
        self.remote_video_track = None;
        self.received_remote_first_frame_decoded = false;
    }
}
