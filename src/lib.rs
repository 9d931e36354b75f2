//! # airhome
//!
//! A single-device RAOP audio receiver: accepts control connections from
//! senders, negotiates sessions over RTSP and plays the streamed PCM on a
//! local output device.
//!
//! ## Example
//!
//! ```rust,no_run
//! use airhome::audio::create_default_backend;
//! use airhome::receiver::{RaopReceiver, ReceiverConfig};
//!
//! # async fn example() -> Result<(), airhome::AirHomeError> {
//! let backend = create_default_backend(None)?;
//! let mut receiver = RaopReceiver::new(ReceiverConfig::with_name("Kitchen"), backend);
//!
//! let addr = receiver.start().await?;
//! println!("listening on {addr}");
//!
//! tokio::signal::ctrl_c().await?;
//! receiver.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Host**: [`ReceiverService`] ties the engine to advertisement and the
//!   persisted configuration
//! - **Engine**: [`RaopReceiver`] accepts connections and owns the session
//!   registry
//! - **Protocol**: sans-IO RTSP codec, SDP scanner, RTP framing
//! - **Audio**: ingestion queue, decoders and output backends

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error types
pub mod error;

/// Testing utilities
pub mod testing;

pub mod audio;
pub mod discovery;
pub mod protocol;
pub mod receiver;

pub use error::{AirHomeError, Result};
pub use receiver::{
    ConfigSnapshot, RaopReceiver, ReceiverConfig, ReceiverEvent, ReceiverService, SessionState,
};
