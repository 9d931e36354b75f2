//! Testing utilities
//!
//! Test doubles for the receiver's collaborators: an in-memory audio
//! backend, a scripted RTSP sender and a recording advertiser.

pub mod mock_advertiser;
pub mod mock_sender;
pub mod recording;

pub use mock_advertiser::{Advertisement, MockAdvertiser};
pub use mock_sender::{MockSender, MockSenderError};
pub use recording::{RecordingBackend, RecordingSink};

use crate::audio::AudioBackend;
use crate::receiver::ReceiverConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Config listening on an ephemeral loopback port
#[must_use]
pub fn loopback_config() -> ReceiverConfig {
    ReceiverConfig::with_name("Test Receiver")
        .bind_addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .port(0)
        .audio_port(0)
}

/// Upcast a recording backend for the engine
#[must_use]
pub fn as_backend(backend: &Arc<RecordingBackend>) -> Arc<dyn AudioBackend> {
    backend.clone()
}
