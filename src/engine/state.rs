//! State/reason/event sum types and the observation payloads built from
//! them.

use crate::error::CallErrorEvent;
use crate::call_info::MilestoneEntry;

/// The call's position in its lifecycle, and which commands/signals drive
/// each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    Idle,
    Prepared,
    Calling,
    Connecting,
    Connected,
}

impl CallState {
    /// True for any state where a call is in progress: a `call_id` is held,
    /// a media session exists, and `prepare_for_call`/`call` must be
    /// rejected with `StateMismatch`.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            CallState::Calling | CallState::Connecting | CallState::Connected
        )
    }
}

/// Attached to every `callStateChanged` observation, explaining *why* the
/// transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateReason {
    None,
    LocalVideoCall,
    LocalAudioCall,
    RemoteVideoCall,
    RemoteAudioCall,
    LocalAccepted,
    RemoteAccepted,
    LocalRejected,
    RemoteRejected,
    RemoteCallBusy,
    LocalCancel,
    RemoteCancel,
    LocalHangup,
    RemoteHangup,
    RecvRemoteFirstFrame,
    CallingTimeout,
}

/// Finer-grained than [`CallState`]/[`StateReason`]: a log of everything
/// noteworthy that happened, including events that don't move the state
/// machine (e.g. `JoinRtcStart`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OnCalling,
    RemoteUserRecvCall,
    LocalAccepted,
    RemoteAccepted,
    LocalRejected,
    RemoteRejected,
    RemoteCallBusy,
    LocalCancelled,
    RemoteCancelled,
    LocalHangup,
    RemoteHangup,
    JoinRtcStart,
    JoinRtcSucceeded,
    LocalJoined,
    RemoteJoined,
    LocalLeft,
    RemoteLeft,
    PublishFirstLocalVideoFrame,
    RecvRemoteFirstFrame,
    CallingTimeout,
    RemoteCallingTimeout,
    /// A command or inbound signal was rejected because the engine was not
    /// in a state that permits it. Carries the command name for
    /// diagnostics.
    StateMismatch(&'static str),
}

/// Extra context attached to a `callStateChanged` observation. Not every
/// transition populates every field; see the call sites for which fields a
/// given reason carries.
#[derive(Debug, Clone, Default)]
pub struct EventInfo {
    pub remote_user_id: Option<String>,
    pub from_user_id: Option<String>,
    pub reject_reason: Option<String>,
    pub cancel_call_by_internal: Option<crate::message::Origin>,
}

/// One `callStateChanged` observation.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub from: CallState,
    pub to: CallState,
    pub reason: StateReason,
    pub info: EventInfo,
}

/// Re-exported here so callers who only import `engine::state` can still
/// name the error and call-info observation payloads without an extra `use`.
pub type ErrorObservation = CallErrorEvent;
pub type InfoObservation = Vec<MilestoneEntry>;
