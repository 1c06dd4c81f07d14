//! Node configuration.
//!
//! Loaded from a YAML document; every section and field falls back to the
//! shipping defaults when omitted, so a partial file only overrides what it
//! names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sunlink_radio::{
    DataRate, LinkConfig, PaLevel, RadioError, RadioManagerConfig, ADDRESS_WIDTH,
};

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        /// Path the node tried to load.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The document did not parse into a node configuration.
    #[error("Cannot parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The radio pipe address has the wrong length.
    #[error("Radio address {address:?} must be exactly {expected} bytes")]
    BadAddress {
        /// Address string as configured.
        address: String,
        /// Required length in bytes.
        expected: usize,
    },

    /// A link parameter is out of hardware range.
    #[error("Invalid link parameters: {0}")]
    Link(#[from] RadioError),

    /// A zero tick interval would spin the run loop flat out.
    #[error("tick_interval_ms must be nonzero")]
    ZeroTickInterval,
}

// ============================================================================
// Radio Section
// ============================================================================

/// Radio link parameters as they appear in the configuration file. The pipe
/// address is kept as an ASCII string here and turned into the fixed-width
/// byte form by [`RadioSection::link_config`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RadioSection {
    /// RF channel, 0 through 125.
    pub channel: u8,
    /// Air data rate.
    pub data_rate: DataRate,
    /// Power amplifier level.
    pub pa_level: PaLevel,
    /// Pipe address, exactly 5 ASCII bytes.
    pub address: String,
}

impl Default for RadioSection {
    fn default() -> Self {
        RadioSection {
            channel: 76,
            data_rate: DataRate::default(),
            pa_level: PaLevel::default(),
            address: "3STUS".to_string(),
        }
    }
}

impl RadioSection {
    /// Turn the section into validated link parameters.
    pub fn link_config(&self) -> Result<LinkConfig, ConfigError> {
        let bytes = self.address.as_bytes();
        if bytes.len() != ADDRESS_WIDTH {
            return Err(ConfigError::BadAddress {
                address: self.address.clone(),
                expected: ADDRESS_WIDTH,
            });
        }
        let mut address = [0u8; ADDRESS_WIDTH];
        address.copy_from_slice(bytes);
        let link = LinkConfig {
            channel: self.channel,
            data_rate: self.data_rate,
            pa_level: self.pa_level,
            address,
            ..LinkConfig::default()
        };
        link.validate()?;
        Ok(link)
    }
}

// ============================================================================
// Node Configuration
// ============================================================================

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name used in logs and reports.
    pub name: String,
    /// Radio link parameters.
    pub radio: RadioSection,
    /// Transmission manager tuning.
    pub transmit: RadioManagerConfig,
    /// Pause between run-loop rounds, in milliseconds.
    pub tick_interval_ms: u64,
    /// Device ids whose identity makes PID-less history frames routable.
    /// Empty selects the built-in battery-monitor set.
    pub supplemental_pids: Vec<u16>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            name: "sunlink".to_string(),
            radio: RadioSection::default(),
            transmit: RadioManagerConfig::default(),
            tick_interval_ms: 10,
            supplemental_pids: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: NodeConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the bounds the serde layer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        self.radio.link_config()?;
        Ok(())
    }

    /// Set the node name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the run-loop tick interval in milliseconds.
    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick_interval_ms = interval_ms;
        self
    }

    /// Set the transmission manager tuning.
    pub fn with_transmit(mut self, transmit: RadioManagerConfig) -> Self {
        self.transmit = transmit;
        self
    }

    /// Override the supplemental-eligible device ids.
    pub fn with_supplemental_pids(mut self, pids: Vec<u16>) -> Self {
        self.supplemental_pids = pids;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
