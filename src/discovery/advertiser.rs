//! RAOP service advertisement
//!
//! The engine does not depend on advertisement. The host wrapper publishes
//! the receiver through an [`Advertiser`] once the engine is listening.

use std::collections::HashMap;

use mdns_sd::{Error as MdnsError, ServiceDaemon, ServiceInfo};

/// DNS-SD service type for RAOP receivers
pub const RAOP_SERVICE_TYPE: &str = "_raop._tcp.local.";

/// Errors from service advertisement
#[derive(Debug, thiserror::Error)]
pub enum AdvertiserError {
    /// Failed to retrieve MAC address
    #[error("Failed to retrieve MAC address: {0}")]
    MacRetrievalFailed(String),

    /// mDNS error
    #[error("mDNS error: {0}")]
    Mdns(#[from] MdnsError),

    /// Service not registered
    #[error("Service not registered")]
    NotRegistered,

    /// Service already registered
    #[error("Service already registered")]
    AlreadyRegistered,
}

/// Publishes the receiver on the local network
pub trait Advertiser: Send {
    /// Hardware-style identifier used in the service name and `deviceid`
    fn device_mac(&self) -> [u8; 6];

    /// Register the service
    ///
    /// # Errors
    ///
    /// Returns `AdvertiserError` if already advertising or registration fails.
    fn advertise(
        &mut self,
        name: &str,
        port: u16,
        properties: HashMap<String, String>,
    ) -> Result<(), AdvertiserError>;

    /// Withdraw the service
    ///
    /// # Errors
    ///
    /// Returns `AdvertiserError::NotRegistered` if nothing is advertised.
    fn stop_advertising(&mut self) -> Result<(), AdvertiserError>;

    /// Whether a service is currently registered
    fn is_advertising(&self) -> bool;
}

/// Retrieve a MAC address for service identification
///
/// Uses the first physical interface on Linux and falls back to a stable
/// pseudo-MAC everywhere else.
#[must_use]
pub fn get_device_mac() -> [u8; 6] {
    #[cfg(target_os = "linux")]
    {
        get_mac_linux().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Using generated device id");
            generate_stable_mac()
        })
    }

    #[cfg(not(target_os = "linux"))]
    {
        generate_stable_mac()
    }
}

#[cfg(target_os = "linux")]
fn get_mac_linux() -> Result<[u8; 6], AdvertiserError> {
    use std::fs;

    let entries = fs::read_dir("/sys/class/net")
        .map_err(|e| AdvertiserError::MacRetrievalFailed(e.to_string()))?;

    let mut names: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "lo" && !name.starts_with("veth") && !name.starts_with("docker"))
        .collect();
    // Deterministic pick across reboots
    names.sort();

    for name in names {
        let path = format!("/sys/class/net/{name}/address");
        if let Ok(mac) = fs::read_to_string(&path) {
            let mac = mac.trim();
            if mac != "00:00:00:00:00:00" {
                return parse_mac_string(mac);
            }
        }
    }

    Err(AdvertiserError::MacRetrievalFailed(
        "No suitable interface found".into(),
    ))
}

/// Parse `aa:bb:cc:dd:ee:ff`
///
/// # Errors
///
/// Returns `AdvertiserError::MacRetrievalFailed` on malformed input.
pub fn parse_mac_string(mac: &str) -> Result<[u8; 6], AdvertiserError> {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return Err(AdvertiserError::MacRetrievalFailed(format!(
            "Invalid MAC format: {mac}"
        )));
    }

    let mut bytes = [0u8; 6];
    for (byte, part) in bytes.iter_mut().zip(&parts) {
        *byte = u8::from_str_radix(part, 16)
            .map_err(|_| AdvertiserError::MacRetrievalFailed(format!("Invalid hex: {part}")))?;
    }

    Ok(bytes)
}

/// Pseudo-MAC derived from `/etc/machine-id` or the hostname
///
/// Stable across restarts, with the locally-administered bit set.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Each byte is taken from a distinct slice of the hash"
)]
#[must_use]
pub fn generate_stable_mac() -> [u8; 6] {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let seed = std::fs::read_to_string("/etc/machine-id").unwrap_or_else(|_| {
        hostname::get().map_or_else(
            |_| "airhome-receiver".to_string(),
            |h| h.to_string_lossy().into_owned(),
        )
    });

    let mut hasher = DefaultHasher::new();
    seed.trim().hash(&mut hasher);
    let hash = hasher.finish();

    let mut mac = [0u8; 6];
    for (i, byte) in mac.iter_mut().enumerate() {
        *byte = (hash >> (40 - 8 * i)) as u8;
    }
    mac[0] |= 0x02;
    mac
}

/// MAC as used in the RAOP service name (uppercase, no separators)
#[must_use]
pub fn format_mac_for_service(mac: &[u8; 6]) -> String {
    mac.iter().map(|b| format!("{b:02X}")).collect()
}

/// MAC as used in the `deviceid` TXT value (uppercase, colon separated)
#[must_use]
pub fn format_device_id(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// RAOP service instance name: `<MAC>@<name>`
#[must_use]
pub fn service_name(mac: &[u8; 6], name: &str) -> String {
    format!("{}@{name}", format_mac_for_service(mac))
}

/// TXT record advertised for the receiver
#[must_use]
pub fn raop_properties(mac: &[u8; 6], name: &str) -> HashMap<String, String> {
    [
        ("deviceid", format_device_id(mac).as_str()),
        ("features", "0x5A7FFFF7,0x1E"),
        ("model", "AirHome"),
        ("srcvers", "220.68"),
        ("pw", "false"),
        ("tp", "UDP"),
        ("vn", "65537"),
        ("vs", "220.68"),
        ("sv", "false"),
        ("et", "0,1,3,5"),
        ("ek", "1"),
        ("cn", "0,1,2,3"),
        ("ch", "2"),
        ("ss", "16"),
        ("sr", "44100"),
        ("txtvers", "1"),
        ("sf", "0x4"),
        ("md", "0,1,2"),
        ("am", name),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// mDNS advertiser backed by `mdns-sd`
///
/// The daemon thread is started on first registration.
pub struct MdnsAdvertiser {
    mac: [u8; 6],
    daemon: Option<ServiceDaemon>,
    service_fullname: Option<String>,
}

impl MdnsAdvertiser {
    /// Advertiser using this machine's device id
    #[must_use]
    pub fn new() -> Self {
        Self::with_mac(get_device_mac())
    }

    /// Advertiser with an explicit device id
    #[must_use]
    pub fn with_mac(mac: [u8; 6]) -> Self {
        Self {
            mac,
            daemon: None,
            service_fullname: None,
        }
    }

    fn daemon(&mut self) -> Result<&ServiceDaemon, AdvertiserError> {
        if self.daemon.is_none() {
            self.daemon = Some(ServiceDaemon::new()?);
        }
        self.daemon
            .as_ref()
            .ok_or_else(|| AdvertiserError::Mdns(MdnsError::Msg("daemon unavailable".into())))
    }
}

impl Default for MdnsAdvertiser {
    fn default() -> Self {
        Self::new()
    }
}

impl Advertiser for MdnsAdvertiser {
    fn device_mac(&self) -> [u8; 6] {
        self.mac
    }

    fn advertise(
        &mut self,
        name: &str,
        port: u16,
        properties: HashMap<String, String>,
    ) -> Result<(), AdvertiserError> {
        if self.service_fullname.is_some() {
            return Err(AdvertiserError::AlreadyRegistered);
        }

        let instance = service_name(&self.mac, name);
        let host = hostname::get().map_or_else(
            |_| "airhome".to_string(),
            |h| h.to_string_lossy().replace(' ', "-").to_lowercase(),
        );
        let host_name = format!("{host}.local.");

        let info = ServiceInfo::new(RAOP_SERVICE_TYPE, &instance, &host_name, "", port, properties)?
            .enable_addr_auto();
        let fullname = info.get_fullname().to_string();

        self.daemon()?.register(info)?;
        self.service_fullname = Some(fullname);

        tracing::info!(name = %instance, port, "RAOP service registered");
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), AdvertiserError> {
        let fullname = self
            .service_fullname
            .take()
            .ok_or(AdvertiserError::NotRegistered)?;

        self.daemon()?.unregister(&fullname)?;
        tracing::info!(name = %fullname, "RAOP service unregistered");
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.service_fullname.is_some()
    }
}

impl Drop for MdnsAdvertiser {
    fn drop(&mut self) {
        if self.service_fullname.is_some() {
            let _ = self.stop_advertising();
        }
        if let Some(daemon) = self.daemon.take() {
            let _ = daemon.shutdown();
        }
    }
}
