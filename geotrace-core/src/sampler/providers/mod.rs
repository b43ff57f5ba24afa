//! Location provider implementations
//!
//! - [`GpsdProvider`] subscribes to a local gpsd daemon over TCP.
//! - [`ReplayProvider`] feeds fixes from a JSONL file, for demos and tests.

mod gpsd;
mod replay;

pub use gpsd::GpsdProvider;
pub use replay::ReplayProvider;
