//! Configuration Module
//!
//! Immutable limits record for the size-of engine. The record is produced by an
//! external configuration loader; this module only validates it and resolves
//! missing values to the unbounded sentinel.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SizeOfError};

/// Sentinel for "no limit". Distinct from zero, which is rejected.
pub const UNBOUNDED: u64 = u64::MAX;

/// Environment variable holding the object graph limit
pub const ENV_MAX_OBJECT_GRAPH_SIZE: &str = "SIZEOF_MAX_OBJECT_GRAPH_SIZE";

/// Environment variable holding the per-object byte limit
pub const ENV_MAX_OBJECT_SIZE: &str = "SIZEOF_MAX_OBJECT_SIZE";

/// Size-of engine limits.
///
/// Both limits are at least 1 once constructed. Fields are private so a
/// validated record cannot be altered afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSizeOfEngineConfig")]
pub struct SizeOfEngineConfig {
    /// Maximum number of distinct objects a single walk may visit
    max_object_graph_size: u64,
    /// Maximum size in bytes a single object may contribute
    max_object_size: u64,
}

/// Wire form of the configuration: every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSizeOfEngineConfig {
    #[serde(default)]
    max_object_graph_size: Option<u64>,
    #[serde(default)]
    max_object_size: Option<u64>,
}

impl TryFrom<RawSizeOfEngineConfig> for SizeOfEngineConfig {
    type Error = SizeOfError;

    fn try_from(raw: RawSizeOfEngineConfig) -> Result<Self> {
        Self::new(
            raw.max_object_graph_size.unwrap_or(UNBOUNDED),
            raw.max_object_size.unwrap_or(UNBOUNDED),
        )
    }
}

impl SizeOfEngineConfig {
    // == Constructor ==
    /// Creates a validated configuration.
    ///
    /// # Arguments
    /// * `max_object_graph_size` - Distinct objects a walk may visit (>= 1)
    /// * `max_object_size` - Bytes a single object may contribute (>= 1)
    pub fn new(max_object_graph_size: u64, max_object_size: u64) -> Result<Self> {
        let config = Self {
            max_object_graph_size,
            max_object_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration with neither limit set.
    pub fn unbounded() -> Self {
        Self {
            max_object_graph_size: UNBOUNDED,
            max_object_size: UNBOUNDED,
        }
    }

    /// Returns a copy with the object graph limit replaced.
    pub fn with_max_object_graph_size(self, max_object_graph_size: u64) -> Result<Self> {
        Self::new(max_object_graph_size, self.max_object_size)
    }

    /// Returns a copy with the per-object byte limit replaced.
    pub fn with_max_object_size(self, max_object_size: u64) -> Result<Self> {
        Self::new(self.max_object_graph_size, max_object_size)
    }

    // == From Env ==
    /// Loads the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `SIZEOF_MAX_OBJECT_GRAPH_SIZE` - Object graph limit (default: unbounded)
    /// - `SIZEOF_MAX_OBJECT_SIZE` - Per-object byte limit (default: unbounded)
    ///
    /// Unset variables fall back to unbounded. A value that is not a positive
    /// integer is rejected.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| -> Result<u64> {
            match lookup(key) {
                None => Ok(UNBOUNDED),
                Some(value) => value.trim().parse().map_err(|_| {
                    SizeOfError::InvalidConfiguration(format!(
                        "{} must be a positive integer, got {:?}",
                        key, value
                    ))
                }),
            }
        };

        Self::new(read(ENV_MAX_OBJECT_GRAPH_SIZE)?, read(ENV_MAX_OBJECT_SIZE)?)
    }

    // == Validate ==
    /// Checks that both limits are positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_object_graph_size < 1 {
            return Err(SizeOfError::InvalidConfiguration(
                "maxObjectGraphSize must be >= 1".to_string(),
            ));
        }
        if self.max_object_size < 1 {
            return Err(SizeOfError::InvalidConfiguration(
                "maxObjectSize must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum number of distinct objects a walk may visit.
    pub fn max_object_graph_size(&self) -> u64 {
        self.max_object_graph_size
    }

    /// Maximum size in bytes a single object may contribute.
    pub fn max_object_size(&self) -> u64 {
        self.max_object_size
    }
}

impl Default for SizeOfEngineConfig {
    fn default() -> Self {
        Self::unbounded()
    }
}
