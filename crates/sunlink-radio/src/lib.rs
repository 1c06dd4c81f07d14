//! Radio link abstraction and transmission management.
//!
//! [`RadioLink`] is the seam to the transceiver hardware. [`RadioManager`]
//! drives it: a bounded FIFO of outgoing messages, a minimum gap between
//! sends, quadratic retry backoff with a give-up ceiling, and a silence
//! check that surfaces when nothing has gone out for too long.
//!
//! The manager never touches sensors or indicators. Every
//! [`RadioManager::tick`] returns a [`TickOutcome`] and the embedding loop
//! reacts to it.

mod link;
mod manager;
pub mod mock;

pub use link::*;
pub use manager::*;
