//! RAOP receiver engine
//!
//! Accepts control connections, runs the per-connection RTSP state machine
//! and owns the per-session audio pipeline.

pub mod announce_handler;
pub mod artwork_handler;
pub mod config;
pub mod context;
pub mod events;
pub mod metadata_handler;
pub mod playback;
pub mod rtp_receiver;
pub mod rtsp_handler;
pub mod server;
pub mod service;
pub mod session;
pub mod session_registry;
pub mod set_parameter_handler;
pub mod volume_handler;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, ConfigSnapshot, ReceiverConfig};
pub use context::ReceiverContext;
pub use events::ReceiverEvent;
pub use server::{RaopReceiver, ReceiverError, ReceiverState};
pub use service::ReceiverService;
pub use session::{Session, SessionError, SessionState};
pub use session_registry::SessionRegistry;
pub use volume_handler::db_to_gain;
