//! Sunlink Node
//!
//! The assembled telemetry pipeline for a solar sensor node: VE.Direct bytes
//! in, classified binary messages out over the radio link.
//!
//! ```text
//! TelemetrySource -> FrameParser -> FrameRouter -> RadioManager -> RadioLink
//!                                       |
//!                                 SensorProvider
//! ```
//!
//! The [`Node`] run loop drives the stages cooperatively from one thread;
//! the `sunlink` binary wires it to a replayed byte capture and a logging
//! radio. Hardware targets supply their own [`TelemetrySource`],
//! [`SensorProvider`], and radio link implementations through the same
//! constructors.

mod config;
mod context;
mod error;
mod node;
mod router;
mod sensor;
mod source;

pub use config::*;
pub use context::*;
pub use error::*;
pub use node::*;
pub use router::*;
pub use sensor::*;
pub use source::*;
