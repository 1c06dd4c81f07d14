//! Radio message catalog for sunlink telemetry nodes.
//!
//! Every payload that crosses the radio link is one of a closed set of
//! fixed-layout messages. The first byte of every encoded payload is the
//! message ID; the receiver dispatches on it before reading anything else.
//!
//! | Message                 | ID | Encoded size (bytes) |
//! |-------------------------|----|----------------------|
//! | `StatusMessage`         | 1  | 22                   |
//! | `ChargerMessage`        | 2  | 32                   |
//! | `InverterMessage`       | 3  | 29                   |
//! | `BatteryMessage`        | 4  | 25                   |
//! | `BatteryHistoryMessage` | 5  | 27                   |
//!
//! All multi-byte fields are little-endian. The largest message is exactly
//! [`MAX_WIRE_LEN`] bytes, the payload ceiling of the radio link.
//!
//! ```rust
//! use sunlink_message::{encode_message, decode_message, ChargerMessage, Message};
//!
//! let msg = Message::Charger(ChargerMessage {
//!     battery_voltage: 12.8,
//!     ..Default::default()
//! });
//! let bytes = encode_message(&msg);
//! let back = decode_message(&bytes).unwrap();
//! assert_eq!(back, msg);
//! ```

mod catalog;
mod codec;
mod error;

pub use catalog::*;
pub use codec::*;
pub use error::*;
