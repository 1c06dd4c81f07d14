//! Error types for sunlink-message.

use thiserror::Error;

/// Errors that can occur while decoding a received payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload carried no bytes at all.
    #[error("Empty payload")]
    Empty,

    /// The first byte is not a known message ID.
    #[error("Unknown message id 0x{0:02X}")]
    UnknownId(u8),

    /// The payload length does not match the fixed layout for its ID.
    #[error("Wrong length for message id 0x{id:02X}: {actual} bytes (expected {expected})")]
    WrongLength {
        /// Message ID from the first byte.
        id: u8,
        /// Layout size for that ID.
        expected: usize,
        /// Bytes actually received.
        actual: usize,
    },
}
