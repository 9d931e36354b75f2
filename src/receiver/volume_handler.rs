//! Volume handling
//!
//! Senders report volume in dB where -30 is the quietest audible step and
//! anything at or below it means silence.

use std::str::FromStr;

/// Lowest volume a session stores; at or below this the output is muted
pub const VOLUME_MIN_DB: f32 = -30.0;
/// Full volume
pub const VOLUME_MAX_DB: f32 = 0.0;

/// Volume update from `SET_PARAMETER`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeUpdate {
    /// Volume in dB, as sent
    pub db: f32,
}

impl VolumeUpdate {
    /// Volume clamped to the session range
    #[must_use]
    pub fn clamped_db(&self) -> f32 {
        clamp_db(self.db)
    }

    /// Linear gain for the output device
    #[must_use]
    pub fn gain(&self) -> f32 {
        db_to_gain(self.db)
    }
}

/// Parse volume from a `text/parameters` body
///
/// Format: `volume: -15.000000\r\n`. The first parsable `volume:` line wins.
#[must_use]
pub fn parse_volume_parameter(body: &str) -> Option<VolumeUpdate> {
    body.lines()
        .filter_map(|line| line.trim().strip_prefix("volume:"))
        .find_map(|value| f32::from_str(value.trim()).ok())
        .filter(|db| !db.is_nan())
        .map(|db| VolumeUpdate { db })
}

/// Clamp a dB value into `[-30, 0]`
#[must_use]
pub fn clamp_db(db: f32) -> f32 {
    if db.is_nan() {
        return VOLUME_MAX_DB;
    }
    db.clamp(VOLUME_MIN_DB, VOLUME_MAX_DB)
}

/// Convert dB volume to linear gain
///
/// `10^(db/20)`, with everything at or below -30 dB mapped to 0 and
/// everything at or above 0 dB mapped to 1.
#[must_use]
pub fn db_to_gain(db: f32) -> f32 {
    if db <= VOLUME_MIN_DB {
        return 0.0;
    }
    if db >= VOLUME_MAX_DB {
        return 1.0;
    }

    10.0_f32.powf(db / 20.0)
}
