//! Relay server link: line-delimited JSON over any byte transport.
//!
//! ```text
//!  Transport ──▶ LineDecoder ──▶ CommandGate ──▶ decode_command ──▶ CommandMailbox
//!  Transport ◀── encode_status ◀── TelemetryData
//! ```

pub mod codec;
pub mod gate;
pub mod link;
pub mod mailbox;
pub mod transport;
