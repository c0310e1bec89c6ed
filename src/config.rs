// In: src/config.rs

//! The single source of truth for the substream engine's tunables.
//!
//! `TambakConfig` is created once at the application boundary (from JSON, a
//! Python dictionary or `Default`) and passed by reference into the Arrow
//! bridge and the codec planner.

use crate::error::TambakError;
use serde::{Deserialize, Serialize};

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Defines the trade-off between compression speed and final stream size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionProfile {
    /// Prioritizes speed over size.
    Fast,

    /// A balance between speed and size. This is the recommended default.
    #[default]
    Balanced,

    /// Prioritizes the smallest streams at the cost of CPU time.
    HighCompression,
}

impl CompressionProfile {
    /// The zstd level used for every stream under this profile.
    pub fn zstd_level(&self) -> i32 {
        match self {
            CompressionProfile::Fast => 1,
            CompressionProfile::Balanced => 3,
            CompressionProfile::HighCompression => 19,
        }
    }
}

//==================================================================================
// II. The Unified TambakConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TambakConfig {
    /// The profile guiding the zstd level of every stream.
    #[serde(default)]
    pub profile: CompressionProfile,

    /// If true, fixed-width value streams are byte-shuffled before zstd.
    /// Structural streams (null maps, sizes, dictionary indexes) never are.
    #[serde(default = "default_true")]
    pub enable_special_compression: bool,

    /// Rows per bulk call when a whole column is written or read in granules.
    #[serde(default = "default_granule_rows")]
    pub granule_rows: usize,

    /// Average size of one value in bytes, passed to readers as an allocation hint.
    #[serde(default)]
    pub avg_value_size_hint: f64,
}

impl Default for TambakConfig {
    fn default() -> Self {
        Self {
            profile: CompressionProfile::default(),
            enable_special_compression: true,
            granule_rows: default_granule_rows(),
            avg_value_size_hint: 0.0,
        }
    }
}

impl TambakConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TambakError> {
        let config: TambakConfig = serde_json::from_str(json)?;
        if config.granule_rows == 0 {
            return Err(TambakError::InvalidConfig(
                "granule_rows must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

/// Helper for `serde` to provide a default for `granule_rows`.
fn default_granule_rows() -> usize {
    8192
}
