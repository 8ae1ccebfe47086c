//! In-memory fakes for the two external adapters, used by this
//! crate's own test suite and exported so integration tests in `tests/` can
//! build multi-engine scenarios without a real transport or media SDK.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::media::{
    FirstFrameHandler, MediaClient, MediaClientEvent, MediaEventHandler, MediaKind, Surface, Track,
};
use crate::transport::{MessageReceiveHandler, SignalingTransport};

/// Routes `send_message` calls directly into every peer registered on the
/// same switchboard, bypassing any real network.
#[derive(Default)]
pub struct FakeSwitchboard {
    peers: StdMutex<HashMap<String, Weak<FakeSignalingTransport>>>,
}

impl FakeSwitchboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(self: &Arc<Self>, user_id: &str, transport: &Arc<FakeSignalingTransport>) {
        self.peers
            .lock()
            .unwrap()
            .insert(user_id.to_string(), Arc::downgrade(transport));
    }
}

/// A [`SignalingTransport`] backed by a [`FakeSwitchboard`] instead of a
/// socket. `send_message` looks the destination up in the switchboard and
/// invokes its registered receive handler synchronously.
pub struct FakeSignalingTransport {
    switchboard: Arc<FakeSwitchboard>,
    handler: StdMutex<Option<MessageReceiveHandler>>,
}

impl FakeSignalingTransport {
    /// A transport with no switchboard — `send_message` always fails. Useful
    /// for exercising error paths without wiring up a full scenario.
    pub fn new() -> Self {
        FakeSignalingTransport {
            switchboard: FakeSwitchboard::new(),
            handler: StdMutex::new(None),
        }
    }

    pub fn joining(switchboard: &Arc<FakeSwitchboard>, user_id: &str) -> Arc<Self> {
        let transport = Arc::new(FakeSignalingTransport {
            switchboard: switchboard.clone(),
            handler: StdMutex::new(None),
        });
        switchboard.register(user_id, &transport);
        transport
    }
}

impl Default for FakeSignalingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingTransport for FakeSignalingTransport {
    async fn send_message(&self, user_id: &str, payload: &str) -> anyhow::Result<()> {
        let target = self
            .switchboard
            .peers
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(Weak::upgrade);
        match target {
            Some(transport) => {
                let handler = transport.handler.lock().unwrap();
                if let Some(handler) = handler.as_ref() {
                    handler(payload.to_string());
                }
                Ok(())
            }
            None => anyhow::bail!("no peer registered for user id {user_id}"),
        }
    }

    fn subscribe_message_receive(&self, handler: MessageReceiveHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }
}

/// An opaque [`Surface`] that just counts mount/clear calls.
#[derive(Debug, Default)]
pub struct FakeSurface {
    mounted: std::sync::atomic::AtomicUsize,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mount_count(&self) -> usize {
        self.mounted.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Surface for FakeSurface {
    fn mount(&self) {
        self.mounted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn clear(&self) {}
}

struct FakeTrackState {
    playing: bool,
    closed: bool,
    first_frame_handlers: Vec<FirstFrameHandler>,
}

/// A [`Track`] that completes instantly and lets the test fire
/// `first-frame-decoded` on demand via [`FakeTrack::decode_first_frame`].
pub struct FakeTrack {
    kind: MediaKind,
    state: StdMutex<FakeTrackState>,
}

impl FakeTrack {
    pub fn new(kind: MediaKind) -> Arc<Self> {
        Arc::new(FakeTrack {
            kind,
            state: StdMutex::new(FakeTrackState {
                playing: false,
                closed: false,
                first_frame_handlers: Vec::new(),
            }),
        })
    }

    /// Invokes every registered first-frame-decoded handler. Only
    /// meaningful for video tracks; calling it on an audio track is
    /// harmless since nothing ever subscribes.
    pub fn decode_first_frame(&self) {
        let handlers = &self.state.lock().unwrap().first_frame_handlers;
        for handler in handlers {
            handler();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl Track for FakeTrack {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    async fn play(&self, _surface: &dyn Surface) -> anyhow::Result<()> {
        self.state.lock().unwrap().playing = true;
        Ok(())
    }

    fn stop(&self) {
        self.state.lock().unwrap().playing = false;
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.closed = true;
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn subscribe_first_frame_decoded(&self, handler: FirstFrameHandler) {
        self.state.lock().unwrap().first_frame_handlers.push(handler);
    }
}

struct FakeMediaClientState {
    joined: bool,
    handler: Option<MediaEventHandler>,
    subscribed: HashMap<(String, MediaKind), Arc<FakeTrack>>,
}

/// A [`MediaClient`] that joins/publishes/subscribes instantly. Tests drive
/// `user-joined`/`user-published`/etc. by calling [`FakeMediaClient::emit`]
/// directly, simulating the remote peer's media client.
pub struct FakeMediaClient {
    state: StdMutex<FakeMediaClientState>,
}

impl FakeMediaClient {
    pub fn new() -> Self {
        FakeMediaClient {
            state: StdMutex::new(FakeMediaClientState {
                joined: false,
                handler: None,
                subscribed: HashMap::new(),
            }),
        }
    }

    /// Delivers `event` to whatever handler the engine registered, as if the
    /// real media SDK had observed it.
    pub fn emit(&self, event: MediaClientEvent) {
        if let Some(handler) = &self.state.lock().unwrap().handler {
            handler(event);
        }
    }

    /// The track handed back from a prior `subscribe(uid, kind)` call, so a
    /// test can drive `decode_first_frame()` on the exact track the engine
    /// is holding. `None` until the engine has subscribed to that pair.
    pub fn subscribed_track(&self, uid: &str, kind: MediaKind) -> Option<Arc<FakeTrack>> {
        self.state
            .lock()
            .unwrap()
            .subscribed
            .get(&(uid.to_string(), kind))
            .cloned()
    }
}

impl Default for FakeMediaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaClient for FakeMediaClient {
    async fn join(&self, _app_id: &str, _room_id: &str, _token: &str, _user_id: &str) -> anyhow::Result<()> {
        self.state.lock().unwrap().joined = true;
        Ok(())
    }

    async fn leave(&self) -> anyhow::Result<()> {
        self.state.lock().unwrap().joined = false;
        Ok(())
    }

    async fn publish(&self, _tracks: Vec<Arc<dyn Track>>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn subscribe(&self, uid: &str, kind: MediaKind) -> anyhow::Result<Arc<dyn Track>> {
        let track = FakeTrack::new(kind);
        self.state
            .lock()
            .unwrap()
            .subscribed
            .insert((uid.to_string(), kind), track.clone());
        Ok(track)
    }

    async fn unsubscribe(&self, _uid: &str, _kind: MediaKind) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create_local_tracks(
        &self,
        video: bool,
        audio: bool,
    ) -> anyhow::Result<(Option<Arc<dyn Track>>, Option<Arc<dyn Track>>)> {
        let local_video = video.then(|| FakeTrack::new(MediaKind::Video) as Arc<dyn Track>);
        let local_audio = audio.then(|| FakeTrack::new(MediaKind::Audio) as Arc<dyn Track>);
        Ok((local_video, local_audio))
    }

    fn subscribe_events(&self, handler: MediaEventHandler) {
        self.state.lock().unwrap().handler = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn switchboard_routes_messages_between_registered_peers() {
        let switchboard = FakeSwitchboard::new();
        let alice = FakeSignalingTransport::joining(&switchboard, "alice");
        let bob = FakeSignalingTransport::joining(&switchboard, "bob");

        let received = Arc::new(StdMutex::new(None));
        let received_clone = received.clone();
        bob.subscribe_message_receive(Box::new(move |payload| {
            *received_clone.lock().unwrap() = Some(payload);
        }));

        alice.send_message("bob", "hello").await.unwrap();
        assert_eq!(received.lock().unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn send_to_unregistered_peer_fails() {
        let switchboard = FakeSwitchboard::new();
        let alice = FakeSignalingTransport::joining(&switchboard, "alice");
        assert!(alice.send_message("nobody", "hi").await.is_err());
    }

    #[tokio::test]
    async fn fake_track_fires_first_frame_handlers() {
        let track = FakeTrack::new(MediaKind::Video);
        let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fired_clone = fired.clone();
        track.subscribe_first_frame_decoded(Box::new(move || {
            fired_clone.store(true, std::sync::atomic::Ordering::SeqCst);
        }));
        track.decode_first_frame();
        assert!(fired.load(std::sync::atomic::Ordering::SeqCst));
    }
}
