//! Top-level error type for the node binary.

use thiserror::Error;

use crate::config::ConfigError;
use sunlink_radio::RadioError;

/// Anything that can abort the node before or during the run loop.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The radio could not be brought up or reconfigured.
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),

    /// Replay input could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The shutdown handler could not be installed.
    #[error("Shutdown handler error: {0}")]
    Shutdown(#[from] ctrlc::Error),

    /// The link passed its retry ceiling and transmissions were abandoned.
    #[error("Radio link failed permanently after exhausting retries")]
    LinkFailed,
}
