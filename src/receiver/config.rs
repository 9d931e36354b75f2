//! Receiver configuration
//!
//! [`ReceiverConfig`] drives the engine itself. [`ConfigSnapshot`] is the
//! persisted user configuration that the host wrapper reads once and hands
//! to [`ReceiverService`](super::service::ReceiverService).

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Default RTSP control port
pub const DEFAULT_PORT: u16 = 5000;

/// Default value of the `Server` response header
pub const DEFAULT_SERVER_NAME: &str = "AirHome/1.0";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Name used in lifecycle events and advertisement
    pub name: String,

    /// Address the control listener and audio sockets bind to
    pub bind_addr: IpAddr,

    /// RTSP control port (0 = ephemeral)
    pub port: u16,

    /// UDP port bound for audio at SETUP (0 = ephemeral)
    pub audio_port: u16,

    /// Fixed `Server` header sent with every response
    pub server_name: String,

    /// Value of the `Audio-Latency` header sent on RECORD
    pub audio_latency: u32,

    /// Number of buffer periods an opened sink holds
    pub sink_periods: usize,

    /// Output device name (`None` = system default)
    pub audio_device: Option<String>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            name: ConfigSnapshot::DEFAULT_DEVICE_NAME.to_string(),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            audio_port: 0,
            server_name: DEFAULT_SERVER_NAME.to_string(),
            audio_latency: 0,
            sink_periods: 4,
            audio_device: None,
        }
    }
}

impl ReceiverConfig {
    /// Create config with custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the control port
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the bind address
    #[must_use]
    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the UDP audio port
    #[must_use]
    pub fn audio_port(mut self, port: u16) -> Self {
        self.audio_port = port;
        self
    }

    /// Set the `Server` header value
    #[must_use]
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the advertised audio latency
    #[must_use]
    pub fn audio_latency(mut self, latency: u32) -> Self {
        self.audio_latency = latency;
        self
    }

    /// Set sink buffer periods
    #[must_use]
    pub fn sink_periods(mut self, periods: usize) -> Self {
        self.sink_periods = periods.max(1);
        self
    }

    /// Select an output device by name
    #[must_use]
    pub fn audio_device(mut self, device: impl Into<String>) -> Self {
        self.audio_device = Some(device.into());
        self
    }
}

/// Persisted user configuration
///
/// Read once at startup. Unknown fields are ignored and missing fields take
/// their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSnapshot {
    /// Name advertised to senders
    pub device_name: String,
    /// Start the engine when the host starts
    pub auto_start: bool,
    /// Transcoding toggle exposed to the host
    pub transcoding_enabled: bool,
}

impl ConfigSnapshot {
    /// Default advertised name
    pub const DEFAULT_DEVICE_NAME: &'static str = "AirHome Bridge";

    /// Load a snapshot from a JSON file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&contents)?;
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on serialization or I/O failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            device_name: Self::DEFAULT_DEVICE_NAME.to_string(),
            auto_start: true,
            transcoding_enabled: true,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File contents are not valid configuration
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
