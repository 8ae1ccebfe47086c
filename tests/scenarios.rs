//! End-to-end scenarios driven by two (or three) in-process engines wired
//! together through the in-memory fakes in `callkit_rs::testing`. Each test
//! plays out one documented call flow and asserts the resulting
//! `callStateChanged`/`callEventChanged` observations on every side.
//!
//! There is no real network or media SDK involved: `FakeSignalingTransport`
//! delivers messages by spawning the peer's inbound handler directly, and
//! `FakeMediaClient` only reports what a test explicitly `emit()`s. Every
//! test sleeps briefly after a command that kicks off background tasks
//! (invite handling, auto-accept, teardown) to let those tasks run on the
//! single-threaded test runtime, the same pattern `demos/cli.rs` uses.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use callkit_rs::config::{CallEngineConfig, CallType, PrepareConfigUpdate};
use callkit_rs::engine::state::{CallState, Event, StateChange, StateReason};
use callkit_rs::engine::CallEngine;
use callkit_rs::media::{MediaClientEvent, MediaKind};
use callkit_rs::message::Origin;
use callkit_rs::testing::{FakeMediaClient, FakeSignalingTransport, FakeSwitchboard};
use callkit_rs::transport::SignalingTransport;

struct Recorder<T> {
    items: StdMutex<Vec<T>>,
}

impl<T: Clone> Recorder<T> {
    fn new() -> Arc<Self> {
        Arc::new(Recorder {
            items: StdMutex::new(Vec::new()),
        })
    }

    fn snapshot(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }
}

struct Peer {
    engine: CallEngine,
    media: Arc<FakeMediaClient>,
    states: Arc<Recorder<StateChange>>,
    events: Arc<Recorder<Event>>,
}

impl Peer {
    async fn new(switchboard: &Arc<FakeSwitchboard>, user_id: &str) -> Self {
        let transport: Arc<dyn SignalingTransport> = FakeSignalingTransport::joining(switchboard, user_id);
        let media = Arc::new(FakeMediaClient::new());
        let engine = CallEngine::new(
            CallEngineConfig {
                user_id: user_id.to_string(),
                app_id: "demo-app".to_string(),
            },
            transport,
            media.clone(),
        );

        let states = Recorder::new();
        let states_for_sub = states.clone();
        engine
            .subscribe_state_changed(move |change: &StateChange| {
                states_for_sub.items.lock().unwrap().push(change.clone());
            })
            .await;

        let events = Recorder::new();
        let events_for_sub = events.clone();
        engine
            .subscribe_event_changed(move |event: &Event| {
                events_for_sub.items.lock().unwrap().push(event.clone());
            })
            .await;

        Peer {
            engine,
            media,
            states,
            events,
        }
    }

    fn reached(&self, to: CallState, reason: StateReason) -> bool {
        self.states
            .snapshot()
            .iter()
            .any(|change| change.to == to && change.reason == reason)
    }

    fn saw(&self, event: Event) -> bool {
        self.events.snapshot().contains(&event)
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn happy_path_video_reaches_connected_on_both_sides() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    alice.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();

    alice.engine.call("bob", CallType::Video).await.unwrap();
    settle().await;
    assert!(bob.reached(CallState::Calling, StateReason::RemoteVideoCall));

    bob.engine.accept("alice").await.unwrap();
    settle().await;
    assert!(alice.reached(CallState::Connecting, StateReason::RemoteAccepted));
    assert!(bob.reached(CallState::Connecting, StateReason::LocalAccepted));

    alice.media.emit(MediaClientEvent::UserJoined { uid: "bob".into() });
    alice.media.emit(MediaClientEvent::UserPublished {
        uid: "bob".into(),
        kind: MediaKind::Video,
    });
    bob.media.emit(MediaClientEvent::UserJoined { uid: "alice".into() });
    bob.media.emit(MediaClientEvent::UserPublished {
        uid: "alice".into(),
        kind: MediaKind::Video,
    });
    settle().await;

    alice.media.subscribed_track("bob", MediaKind::Video).unwrap().decode_first_frame();
    bob.media.subscribed_track("alice", MediaKind::Video).unwrap().decode_first_frame();
    settle().await;

    assert!(alice.reached(CallState::Connected, StateReason::RecvRemoteFirstFrame));
    assert!(bob.reached(CallState::Connected, StateReason::RecvRemoteFirstFrame));
}

#[tokio::test]
async fn remote_reject_carries_reason_and_tears_down_both_sides() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    alice.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    alice.engine.call("bob", CallType::Video).await.unwrap();
    settle().await;

    bob.engine.reject("alice", "no").await.unwrap();
    settle().await;

    assert!(alice.saw(Event::RemoteRejected));
    let alice_reject = alice
        .states
        .snapshot()
        .into_iter()
        .find(|c| c.to == CallState::Prepared && c.reason == StateReason::RemoteRejected)
        .expect("alice should have observed RemoteRejected");
    assert_eq!(alice_reject.info.reject_reason.as_deref(), Some("no"));

    assert!(bob.reached(CallState::Prepared, StateReason::LocalRejected));
    assert_eq!(alice.engine.get_call_id().await, None);
    assert_eq!(bob.engine.get_call_id().await, None);
}

#[tokio::test]
async fn caller_cancel_before_accept_tears_down_both_sides() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    alice.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    alice.engine.call("bob", CallType::Video).await.unwrap();
    settle().await;

    alice.engine.cancel_call().await.unwrap();
    settle().await;

    assert!(alice.reached(CallState::Prepared, StateReason::LocalCancel));
    assert!(alice.saw(Event::LocalCancelled));

    let bob_cancel = bob
        .states
        .snapshot()
        .into_iter()
        .find(|c| c.to == CallState::Prepared && c.reason == StateReason::RemoteCancel)
        .expect("bob should have observed RemoteCancel");
    assert_eq!(bob_cancel.info.cancel_call_by_internal, Some(Origin::External));
}

#[tokio::test]
async fn caller_times_out_when_callee_never_responds() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    alice
        .engine
        .prepare_for_call(PrepareConfigUpdate {
            call_timeout: Some(Duration::from_millis(80)),
            ..Default::default()
        })
        .await
        .unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();

    alice.engine.call("bob", CallType::Video).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(alice.reached(CallState::Prepared, StateReason::CallingTimeout));
    assert!(alice.saw(Event::CallingTimeout));
    assert_eq!(alice.engine.get_call_id().await, None);
}

#[tokio::test]
async fn busy_caller_auto_rejects_a_third_party_invite() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;
    let carol = Peer::new(&switchboard, "carol").await;

    alice.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    carol.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();

    alice.engine.call("bob", CallType::Video).await.unwrap();
    settle().await;
    assert!(alice.engine.get_call_id().await.is_some());

    carol.engine.call("alice", CallType::Video).await.unwrap();
    settle().await;

    // Alice never changed state on carol's behalf — she's still busy with bob,
    // exactly where she landed after her own `call("bob")`.
    assert!(!alice.saw(Event::StateMismatch("call")));
    assert_eq!(alice.states.snapshot().last().unwrap().to, CallState::Calling);

    assert!(carol.reached(CallState::Prepared, StateReason::RemoteCallBusy));
    assert!(carol.saw(Event::RemoteCallBusy));
}

#[tokio::test]
async fn first_frame_waiting_disabled_connects_immediately_and_still_plays_late_audio() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    let disabled_config = || PrepareConfigUpdate {
        first_frame_waiting_disabled: Some(true),
        ..Default::default()
    };
    alice.engine.prepare_for_call(disabled_config()).await.unwrap();
    bob.engine.prepare_for_call(disabled_config()).await.unwrap();

    alice.engine.call("bob", CallType::Video).await.unwrap();
    settle().await;
    bob.engine.accept("alice").await.unwrap();
    settle().await;

    // No first-frame-decoded callback fired, yet both reached Connected.
    assert!(alice.reached(CallState::Connected, StateReason::RecvRemoteFirstFrame));
    assert!(bob.reached(CallState::Connected, StateReason::RecvRemoteFirstFrame));

    bob.media.emit(MediaClientEvent::UserJoined { uid: "alice".into() });
    bob.media.emit(MediaClientEvent::UserPublished {
        uid: "alice".into(),
        kind: MediaKind::Audio,
    });
    settle().await;

    let audio_track = bob
        .media
        .subscribed_track("alice", MediaKind::Audio)
        .expect("bob should have subscribed to alice's audio");
    assert!(audio_track.is_playing());
}

#[tokio::test]
async fn audio_only_call_never_waits_on_a_video_track() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    alice.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();

    alice.engine.call("bob", CallType::Audio).await.unwrap();
    settle().await;
    assert!(bob.reached(CallState::Calling, StateReason::RemoteAudioCall));

    bob.engine.accept("alice").await.unwrap();
    settle().await;

    assert!(alice.reached(CallState::Connected, StateReason::RecvRemoteFirstFrame));
    assert!(bob.reached(CallState::Connected, StateReason::RecvRemoteFirstFrame));
    assert!(alice.media.subscribed_track("bob", MediaKind::Video).is_none());
    assert!(bob.media.subscribed_track("alice", MediaKind::Video).is_none());
}

#[tokio::test]
async fn glare_admits_each_others_invite_instead_of_auto_rejecting() {
    let switchboard = FakeSwitchboard::new();
    let alice = Peer::new(&switchboard, "alice").await;
    let bob = Peer::new(&switchboard, "bob").await;

    alice.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();
    bob.engine.prepare_for_call(PrepareConfigUpdate::default()).await.unwrap();

    let (alice_result, bob_result) = tokio::join!(
        alice.engine.call("bob", CallType::Video),
        bob.engine.call("alice", CallType::Video),
    );
    alice_result.unwrap();
    bob_result.unwrap();
    settle().await;

    assert!(alice.engine.get_call_id().await.is_some());
    assert!(bob.engine.get_call_id().await.is_some());
    assert!(!alice.saw(Event::RemoteCallBusy));
    assert!(!bob.saw(Event::RemoteCallBusy));
}
