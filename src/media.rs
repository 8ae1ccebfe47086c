//! The media-plane boundary.
//!
//! Grounded on `call::rtp_session` (owns the publish/subscribe send-recv
//! loop for one call) and `media::mod`'s per-codec trait boundary,
//! generalized into the three traits below: [`MediaClient`] (join a channel,
//! publish/subscribe tracks), [`Track`] (play/stop/close one published
//! track), and [`Surface`] (an opaque view handle the application owns and
//! the engine mounts rendered content into).

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Whether a published/subscribed track carries audio or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// A lifecycle observation from the media client, scoped to one remote user.
#[derive(Debug, Clone)]
pub enum MediaClientEvent {
    UserJoined { uid: String },
    UserLeft { uid: String },
    UserPublished { uid: String, kind: MediaKind },
    UserUnpublished { uid: String, kind: MediaKind },
}

/// Invoked synchronously with every [`MediaClientEvent`] the media client emits.
pub type MediaEventHandler = Box<dyn Fn(MediaClientEvent) + Send + Sync>;

/// Invoked when a video track decodes its first frame. Registered per-track
/// via [`Track::subscribe_first_frame_decoded`]; meaningless for audio
/// tracks, which never call it.
pub type FirstFrameHandler = Box<dyn Fn() + Send + Sync>;

/// An opaque view handle the application renders into.
///
/// In a browser-hosted port this would wrap a DOM container; here it is
/// reduced to the two operations the engine actually needs: `mount`
/// signals that a track is about to start rendering into this surface,
/// `clear` detaches whatever was previously mounted. Both are expected to be
/// idempotent.
pub trait Surface: Send + Sync + fmt::Debug {
    fn mount(&self);
    fn clear(&self);
}

/// One published or subscribed media track.
#[async_trait]
pub trait Track: Send + Sync {
    fn kind(&self) -> MediaKind;

    /// Starts rendering this track into `surface`. Implementations must make
    /// this idempotent: calling `play` while already playing into the same
    /// surface is a no-op.
    async fn play(&self, surface: &dyn Surface) -> anyhow::Result<()>;

    fn stop(&self);

    fn close(&self);

    fn is_playing(&self) -> bool;

    /// Registers `handler` to fire once this track (expected: a remote video
    /// track) decodes its first frame. A no-op on tracks that never observe
    /// frame decoding (e.g. audio).
    fn subscribe_first_frame_decoded(&self, handler: FirstFrameHandler);
}

/// Abstract real-time media client consumed by the call engine.
///
/// The engine owns exactly one `Arc<dyn MediaClient>` — either supplied by
/// the application at construction or created internally — for the lifetime
/// of the engine, joining and leaving the same channel across successive
/// calls.
#[async_trait]
pub trait MediaClient: Send + Sync {
    async fn join(
        &self,
        app_id: &str,
        room_id: &str,
        token: &str,
        user_id: &str,
    ) -> anyhow::Result<()>;

    async fn leave(&self) -> anyhow::Result<()>;

    async fn publish(&self, tracks: Vec<Arc<dyn Track>>) -> anyhow::Result<()>;

    async fn subscribe(&self, uid: &str, kind: MediaKind) -> anyhow::Result<Arc<dyn Track>>;

    async fn unsubscribe(&self, uid: &str, kind: MediaKind) -> anyhow::Result<()>;

    /// Creates the local audio and/or video tracks this engine will publish.
    /// An audio-only call requests `video: false` and receives `None`
    /// for the video track.
    async fn create_local_tracks(
        &self,
        video: bool,
        audio: bool,
    ) -> anyhow::Result<(Option<Arc<dyn Track>>, Option<Arc<dyn Track>>)>;

    /// Registers `handler` to be invoked with every `user-joined` /
    /// `user-left` / `user-published` / `user-unpublished` event. The engine
    /// registers exactly one handler per client.
    fn subscribe_events(&self, handler: MediaEventHandler);
}
