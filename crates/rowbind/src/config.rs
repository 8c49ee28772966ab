//! Codec configuration
//!
//! Decoders and encoders interpret temporal columns in a configured zone.
//! The zone is a fixed UTC offset and defaults to UTC.

use crate::error::{Error, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Largest offset chrono accepts, exclusive
const MAX_OFFSET_SECONDS: u32 = 86_400;

/// Configuration shared by decoders and encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Offset east of UTC used for temporal columns, in seconds
    pub utc_offset_seconds: i32,
}

impl CodecConfig {
    /// Create a configuration using UTC
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zone offset in seconds east of UTC
    pub fn with_utc_offset(mut self, seconds: i32) -> Self {
        self.utc_offset_seconds = seconds;
        self
    }

    /// Set the zone offset in whole hours east of UTC
    pub fn with_utc_offset_hours(self, hours: i32) -> Self {
        self.with_utc_offset(hours.saturating_mul(3600))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.utc_offset_seconds.unsigned_abs() >= MAX_OFFSET_SECONDS {
            return Err(Error::InvalidConfig(format!(
                "utc_offset_seconds must be within +/-{MAX_OFFSET_SECONDS}, got {}",
                self.utc_offset_seconds
            )));
        }
        Ok(())
    }

    /// Get the configured zone
    pub fn zone(&self) -> Result<FixedOffset> {
        self.validate()?;
        FixedOffset::east_opt(self.utc_offset_seconds).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "utc_offset_seconds out of range: {}",
                self.utc_offset_seconds
            ))
        })
    }
}

/// Conversion context handed to every codec call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecContext {
    zone: FixedOffset,
}

impl CodecContext {
    /// Create a context for the given zone
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    /// Create a context from a validated configuration
    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        Ok(Self::new(config.zone()?))
    }

    /// Zone used to interpret and render temporal columns
    pub fn zone(&self) -> FixedOffset {
        self.zone
    }
}

impl Default for CodecContext {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}
