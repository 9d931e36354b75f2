//! Run a receiver on the default output device and advertise it
//!
//! Reads `airhome.json` from the working directory if present.
//! Set `RUST_LOG=airhome=debug` for protocol traces.

use airhome::audio::create_default_backend;
use airhome::discovery::MdnsAdvertiser;
use airhome::receiver::{ConfigSnapshot, ReceiverConfig, ReceiverEvent, ReceiverService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "airhome=info".into()))
        .init();

    let snapshot = ConfigSnapshot::load("airhome.json")?;
    let backend = create_default_backend(None)?;
    let mut service = ReceiverService::new(
        snapshot,
        ReceiverConfig::default(),
        backend,
        Box::new(MdnsAdvertiser::new()),
    );

    let mut events = service.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ReceiverEvent::Started { name, port } => {
                    println!("Receiver '{name}' started on port {port}");
                }
                ReceiverEvent::ClientConnected { address } => {
                    println!("Client connected from {address}");
                }
                ReceiverEvent::PlaybackStarted { session_id } => {
                    println!("Playback started ({session_id})");
                }
                ReceiverEvent::VolumeChanged { db, gain, .. } => {
                    println!("Volume: {db:.1} dB ({:.0}%)", gain * 100.0);
                }
                ReceiverEvent::MetadataUpdated { metadata, .. } => {
                    if let (Some(title), Some(artist)) = (&metadata.title, &metadata.artist) {
                        println!("Now playing: {artist} - {title}");
                    }
                }
                ReceiverEvent::Stopped => break,
                _ => {}
            }
        }
    });

    if !service.should_auto_start() {
        println!("Auto-start disabled in airhome.json");
        return Ok(());
    }

    let addr = service.on_engine_should_start().await?;
    println!("Listening on {addr}. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    service.on_engine_should_stop().await?;
    println!("Receiver stopped.");

    Ok(())
}
