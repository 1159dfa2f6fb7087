//! `axmsg` — the wire protocol spoken between approx pipeline nodes.
//!
//! Every node is a process connected to its neighbours by byte-stream pipes.
//! Messages ("actions") travel as newline-delimited JSON, one object per line.
//!
//! # Architecture
//!
//! ```text
//! input pipe ──► RecordReader ──► decode ──► Action ──► payload_as::<P>()
//!                     │                                     (Date, Check, Success)
//!                     ▼ raw bytes
//! output pipe ◄── RecordWriter ◄── encode ◄── Action
//! ```
//!
//! [`Diagnostics`] is the side channel: structured log lines on stderr tagged
//! with the node's source name and the correlation id they concern.

pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod reader;
pub mod writer;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use envelope::{
    command, decode, encode, role, Action, ActionKind, Check, Date, RolePayload, SchemaMarker,
    Success, PROTOCOL_VERSION,
};
pub use error::AxError;
pub use reader::RecordReader;
pub use writer::RecordWriter;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AxError>;
