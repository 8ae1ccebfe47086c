//! callkit-rs is a deterministic 1-to-1 call signaling and media
//! orchestration engine.
//!
//! It coordinates two peers through invitation, acceptance, media-channel
//! join, first-frame rendezvous, and teardown, translating asynchronous
//! signaling messages and media-plane events into a single linearized
//! stream of observations. It owns neither the signaling transport nor the
//! media SDK — both are supplied by the application as trait objects (see
//! [`transport::SignalingTransport`], [`media::MediaClient`]) — only the
//! protocol between them.
//!
//! Call [`init_sdk`] once, before constructing the first
//! [`engine::CallEngine`], to install the process-wide defaults (currently:
//! the `log` max level) a media SDK would otherwise set up at module load.
//!
//! To get started, look at [`engine::CallEngine`].

pub mod call_info;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_emitter;
pub mod logging;
pub mod media;
pub mod message;
pub mod transport;

pub mod testing;

/// One-shot process startup. Installs the default log level
/// (`LevelFilter::Info`) so a freshly constructed engine logs something
/// even if the host application never calls
/// [`engine::CallEngine::set_log_level`] itself.
///
/// Safe to call more than once; later calls are no-ops beyond re-setting
/// the same level.
pub fn init_sdk() {
    log::set_max_level(log::LevelFilter::Info);
}
