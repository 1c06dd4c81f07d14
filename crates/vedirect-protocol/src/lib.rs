//! VE.Direct Text Protocol
//!
//! This crate parses the text mode of the Victron VE.Direct serial protocol,
//! the telemetry stream emitted once per second by MPPT charge controllers,
//! Phoenix inverters, and BMV/SmartShunt battery monitors.
//!
//! # Protocol Overview
//!
//! A frame is a sequence of records, each prefixed with `\r\n` and carrying a
//! tab-separated field name and value:
//!
//! ```text
//! \r\n PID     \t 0xA057
//! \r\n V       \t 12800
//! \r\n I       \t -1500
//! \r\n Checksum\t <byte>
//! ```
//!
//! The `Checksum` record closes the frame; the sum of every frame byte,
//! checksum byte included, is zero modulo 256. Hex records (started by `:`
//! and closed by `\n`) may interleave with the text stream; they are drained,
//! dropped, and excluded from the checksum.
//!
//! # Example
//!
//! ```rust,ignore
//! use vedirect_protocol::{FrameEvent, FrameParser};
//!
//! let mut parser = FrameParser::new();
//! for byte in uart_bytes {
//!     if let Some(FrameEvent::Valid(frame)) = parser.feed(byte) {
//!         println!("battery: {:?} mV", frame.decimal("V"));
//!     }
//! }
//! ```

mod fields;
mod frame;
mod parser;
mod pid;

pub use fields::*;
pub use frame::*;
pub use parser::*;
pub use pid::*;
