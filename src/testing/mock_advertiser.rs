//! Advertiser that records calls instead of touching the network

use crate::discovery::{Advertiser, AdvertiserError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One recorded advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Advertised name
    pub name: String,
    /// Advertised port
    pub port: u16,
    /// TXT properties
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct Log {
    current: Option<Advertisement>,
    history: Vec<Advertisement>,
    withdrawals: usize,
    fail: bool,
}

/// Recording advertiser
///
/// Clones share the same log, so a test can keep one handle and give the
/// other to the service.
#[derive(Debug, Clone, Default)]
pub struct MockAdvertiser {
    mac: [u8; 6],
    log: Arc<Mutex<Log>>,
}

impl MockAdvertiser {
    /// Advertiser with a fixed device id
    #[must_use]
    pub fn new(mac: [u8; 6]) -> Self {
        Self {
            mac,
            log: Arc::default(),
        }
    }

    /// Make `advertise` fail
    pub fn set_fail(&self, fail: bool) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).fail = fail;
    }

    /// Currently registered advertisement
    #[must_use]
    pub fn current(&self) -> Option<Advertisement> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    /// Every successful `advertise` call
    #[must_use]
    pub fn history(&self) -> Vec<Advertisement> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    /// Number of successful `stop_advertising` calls
    #[must_use]
    pub fn withdrawals(&self) -> usize {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .withdrawals
    }
}

impl Advertiser for MockAdvertiser {
    fn device_mac(&self) -> [u8; 6] {
        self.mac
    }

    fn advertise(
        &mut self,
        name: &str,
        port: u16,
        properties: HashMap<String, String>,
    ) -> Result<(), AdvertiserError> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if log.fail {
            return Err(AdvertiserError::MacRetrievalFailed("injected failure".into()));
        }
        if log.current.is_some() {
            return Err(AdvertiserError::AlreadyRegistered);
        }

        let ad = Advertisement {
            name: name.to_string(),
            port,
            properties,
        };
        log.history.push(ad.clone());
        log.current = Some(ad);
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), AdvertiserError> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.current.take().ok_or(AdvertiserError::NotRegistered)?;
        log.withdrawals += 1;
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .is_some()
    }
}
