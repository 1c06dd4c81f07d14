//! Radio link parameters and the hardware seam.

use serde::{Deserialize, Serialize};
use sunlink_message::MAX_WIRE_LEN;
use thiserror::Error;

/// Pipe address width in bytes.
pub const ADDRESS_WIDTH: usize = 5;

/// Highest RF channel the transceiver tunes to.
pub const MAX_CHANNEL: u8 = 125;

/// On-air data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRate {
    /// 250 kbps, the longest-range setting.
    Kbps250,
    Mbps1,
    Mbps2,
}

impl Default for DataRate {
    fn default() -> Self {
        DataRate::Kbps250
    }
}

/// Transmit amplifier level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaLevel {
    Min,
    Low,
    High,
    Max,
}

impl Default for PaLevel {
    fn default() -> Self {
        PaLevel::High
    }
}

/// Link parameters applied through [`RadioLink::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// RF channel number (0..=[`MAX_CHANNEL`]).
    pub channel: u8,
    /// On-air data rate.
    pub data_rate: DataRate,
    /// Transmit amplifier level.
    pub pa_level: PaLevel,
    /// Pipe address the base station listens on.
    pub address: [u8; ADDRESS_WIDTH],
    /// Hardware auto-acknowledgement. Off by default; delivery outcome
    /// comes from the write result instead.
    pub auto_ack: bool,
    /// Fixed payload width in bytes.
    pub payload_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            channel: 76,
            data_rate: DataRate::default(),
            pa_level: PaLevel::default(),
            address: *b"3STUS",
            auto_ack: false,
            payload_size: MAX_WIRE_LEN,
        }
    }
}

impl LinkConfig {
    /// Check the parameters against hardware limits.
    pub fn validate(&self) -> Result<(), RadioError> {
        if self.channel > MAX_CHANNEL {
            return Err(RadioError::ChannelOutOfRange {
                channel: self.channel,
                max: MAX_CHANNEL,
            });
        }
        if self.payload_size == 0 || self.payload_size > MAX_WIRE_LEN {
            return Err(RadioError::PayloadSize {
                size: self.payload_size,
                max: MAX_WIRE_LEN,
            });
        }
        Ok(())
    }
}

/// Errors from configuring or operating the transceiver.
#[derive(Debug, Error)]
pub enum RadioError {
    /// Requested channel is outside the tunable range.
    #[error("Channel {channel} out of range (max {max})")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: u8,
        /// Highest channel the hardware accepts.
        max: u8,
    },

    /// Payload size is zero or above the hardware ceiling.
    #[error("Payload size {size} out of range (1..={max})")]
    PayloadSize {
        /// Requested payload size.
        size: usize,
        /// Hardware payload ceiling.
        max: usize,
    },

    /// The transceiver did not come up.
    #[error("Radio init failed: {0}")]
    InitFailed(String),
}

/// Hardware interface of the transceiver.
///
/// Production builds wire in the SPI driver; tests substitute
/// [`crate::mock::MockRadio`].
pub trait RadioLink {
    /// Apply link parameters. Called before the first write and again
    /// after every power-up.
    fn configure(&mut self, config: &LinkConfig) -> Result<(), RadioError>;

    /// Transmit one payload. Returns `true` when the hardware reports the
    /// payload went out.
    fn write(&mut self, payload: &[u8]) -> bool;

    /// Drop into the low-power state.
    fn power_down(&mut self);

    /// Wake the transceiver. The caller reapplies configuration afterward.
    fn power_up(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_link_config_is_valid() {
        let config = LinkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channel, 76);
        assert_eq!(config.payload_size, MAX_WIRE_LEN);
        assert!(!config.auto_ack);
    }

    #[test]
    fn test_channel_above_range_is_rejected() {
        let config = LinkConfig {
            channel: 126,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            RadioError::ChannelOutOfRange { channel: 126, max: 125 }
        ));
    }

    #[test]
    fn test_payload_size_bounds() {
        let zero = LinkConfig {
            payload_size: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let oversized = LinkConfig {
            payload_size: MAX_WIRE_LEN + 1,
            ..Default::default()
        };
        assert!(oversized.validate().is_err());
    }
}
