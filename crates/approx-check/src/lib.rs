//! `approx-check` — a conformance probe that runs as one node of an approx
//! pipeline.
//!
//! Depending on `MODE` it either produces a paced stream of calendar ticks,
//! forwards its input to its output untouched, or performs one processor
//! discovery round trip and passes or fails the run on the reply.

pub mod config;
pub mod driver;
pub mod error;
pub mod pacing;

pub use config::{Cli, Config, Mode, RunMode, Speed};
pub use driver::Driver;
pub use error::{ConfigError, ProbeError};
pub use pacing::Pacer;

/// Source name stamped on every diagnostic of this node.
pub const SOURCE: &str = "approx-check";
