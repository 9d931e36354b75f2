//! Host lifecycle wrapper
//!
//! Ties the engine to presence advertisement and the persisted user
//! configuration. The host decides when to call
//! [`on_engine_should_start`](ReceiverService::on_engine_should_start) and
//! [`on_engine_should_stop`](ReceiverService::on_engine_should_stop).

use super::config::{ConfigSnapshot, ReceiverConfig};
use super::events::ReceiverEvent;
use super::server::{RaopReceiver, ReceiverError};
use crate::audio::AudioBackend;
use crate::discovery::{Advertiser, raop_properties};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Engine plus advertisement, driven by host lifecycle callbacks
pub struct ReceiverService {
    snapshot: ConfigSnapshot,
    receiver: RaopReceiver,
    advertiser: Box<dyn Advertiser>,
}

impl ReceiverService {
    /// Build the service
    ///
    /// The engine name is taken from the snapshot's `device_name`.
    #[must_use]
    pub fn new(
        snapshot: ConfigSnapshot,
        mut config: ReceiverConfig,
        backend: Arc<dyn AudioBackend>,
        advertiser: Box<dyn Advertiser>,
    ) -> Self {
        config.name.clone_from(&snapshot.device_name);
        Self {
            snapshot,
            receiver: RaopReceiver::new(config, backend),
            advertiser,
        }
    }

    /// Configuration the service was built from
    #[must_use]
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Whether the host should start the engine on its own start
    #[must_use]
    pub fn should_auto_start(&self) -> bool {
        self.snapshot.auto_start
    }

    /// The wrapped engine
    #[must_use]
    pub fn receiver(&self) -> &RaopReceiver {
        &self.receiver
    }

    /// Subscribe to engine events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReceiverEvent> {
        self.receiver.subscribe()
    }

    /// Whether the receiver is currently advertised
    #[must_use]
    pub fn is_advertising(&self) -> bool {
        self.advertiser.is_advertising()
    }

    /// Start the engine, then advertise it on the bound port
    ///
    /// An advertisement failure is logged and leaves the engine running;
    /// senders that know the address can still connect.
    ///
    /// # Errors
    ///
    /// Returns `ReceiverError` if the engine cannot start.
    pub async fn on_engine_should_start(&mut self) -> Result<SocketAddr, ReceiverError> {
        let addr = self.receiver.start().await?;

        let name = &self.snapshot.device_name;
        let properties = raop_properties(&self.advertiser.device_mac(), name);
        if let Err(e) = self.advertiser.advertise(name, addr.port(), properties) {
            tracing::warn!(name = %name, error = %e, "Failed to advertise receiver");
        }

        Ok(addr)
    }

    /// Withdraw the advertisement, then stop the engine
    ///
    /// # Errors
    ///
    /// Returns `ReceiverError` if the engine fails to stop.
    pub async fn on_engine_should_stop(&mut self) -> Result<(), ReceiverError> {
        if self.advertiser.is_advertising() {
            if let Err(e) = self.advertiser.stop_advertising() {
                tracing::warn!(error = %e, "Failed to withdraw advertisement");
            }
        }
        self.receiver.stop().await
    }
}
