//! A runnable walkthrough of a happy-path call between two local engines.
//!
//! There is no real signaling transport or media SDK here — both peers run
//! in this process, wired together with the in-memory fakes from
//! `callkit_rs::testing`, standing in for a real transport/media client the
//! way the original CLI stood in for a real SIP server.

use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config as SimpleLogConfig, TermLogger, TerminalMode};

use callkit_rs::config::{CallEngineConfig, CallType, PrepareConfigUpdate};
use callkit_rs::engine::CallEngine;
use callkit_rs::media::MediaClientEvent;
use callkit_rs::media::MediaKind;
use callkit_rs::testing::{FakeMediaClient, FakeSignalingTransport, FakeSwitchboard};
use callkit_rs::transport::SignalingTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Debug,
        SimpleLogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])?;
    callkit_rs::init_sdk();

    let switchboard = FakeSwitchboard::new();

    let alice_transport: Arc<dyn SignalingTransport> =
        FakeSignalingTransport::joining(&switchboard, "alice");
    let bob_transport: Arc<dyn SignalingTransport> =
        FakeSignalingTransport::joining(&switchboard, "bob");

    let alice_media = Arc::new(FakeMediaClient::new());
    let bob_media = Arc::new(FakeMediaClient::new());

    let alice = CallEngine::new(
        CallEngineConfig {
            user_id: "alice".into(),
            app_id: "demo-app".into(),
        },
        alice_transport,
        alice_media.clone(),
    );
    let bob = CallEngine::new(
        CallEngineConfig {
            user_id: "bob".into(),
            app_id: "demo-app".into(),
        },
        bob_transport,
        bob_media.clone(),
    );

    alice
        .subscribe_state_changed(|change| {
            log::info!("alice: {:?} -> {:?} ({:?})", change.from, change.to, change.reason);
        })
        .await;
    bob.subscribe_state_changed(|change| {
        log::info!("bob:   {:?} -> {:?} ({:?})", change.from, change.to, change.reason);
    })
    .await;

    bob.prepare_for_call(PrepareConfigUpdate {
        auto_accept: Some(true),
        ..Default::default()
    })
    .await?;
    alice.prepare_for_call(PrepareConfigUpdate::default()).await?;

    alice.call("bob", CallType::Video).await?;

    // Let the inbound-invite task and bob's auto-accept task run.
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Simulate both media clients observing each other's join and publish,
    // the way a real media SDK would after `rtc_join_and_publish` completes.
    alice_media.emit(MediaClientEvent::UserJoined { uid: "bob".into() });
    alice_media.emit(MediaClientEvent::UserPublished {
        uid: "bob".into(),
        kind: MediaKind::Video,
    });
    bob_media.emit(MediaClientEvent::UserJoined { uid: "alice".into() });
    bob_media.emit(MediaClientEvent::UserPublished {
        uid: "alice".into(),
        kind: MediaKind::Video,
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    println!("alice call id: {:?}", alice.get_call_id().await);
    println!("bob call id:   {:?}", bob.get_call_id().await);

    alice.hangup("bob").await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    Ok(())
}
