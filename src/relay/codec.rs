//! JSON message codec for the relay link.
//!
//! Wire format: one JSON object per line (`\n`-terminated, UTF-8).
//!
//! ```text
//! inbound:  {"command":"SETTINGS","min":25,"sched":false}\n
//! outbound: {"level":50,"pump":false,"temp":21.5,"mode":"AUTO","settings":{...}}\n
//! ```
//!
//! Inbound: `command` is one of `PUMP_ON`, `PUMP_OFF`, `AUTO`, `SETTINGS`.
//! `SETTINGS` takes any subset of `min`, `max`, `sched`, `pre`, `rec`,
//! `h_cm`.  Unknown fields are ignored.

use heapless::{String, Vec};
use serde::Deserialize;

use crate::app::commands::AppCommand;
use crate::app::events::TelemetryData;
use crate::config::SettingsPatch;
use crate::error::DecodeError;

/// Longest accepted inbound line, excluding the terminator.
pub const MAX_LINE: usize = 256;
/// Upper bound of an encoded status message.
pub const MAX_STATUS: usize = 256;

#[derive(Debug, Deserialize)]
struct Inbound {
    command: Option<String<16>>,
    min: Option<u8>,
    max: Option<u8>,
    sched: Option<bool>,
    pre: Option<u8>,
    rec: Option<u8>,
    h_cm: Option<u16>,
}

/// Decode one inbound JSON object into a command.
pub fn decode_command(bytes: &[u8]) -> Result<AppCommand, DecodeError> {
    let msg: Inbound = serde_json::from_slice(bytes).map_err(|_| DecodeError::Malformed)?;
    let command = msg.command.ok_or(DecodeError::MissingCommand)?;
    match command.as_str() {
        "PUMP_ON" => Ok(AppCommand::PumpOn),
        "PUMP_OFF" => Ok(AppCommand::PumpOff),
        "AUTO" => Ok(AppCommand::Auto),
        "SETTINGS" => Ok(AppCommand::Settings(SettingsPatch {
            pump_on_level: msg.min,
            pump_off_level: msg.max,
            schedules_enabled: msg.sched,
            pre_schedule_limit: msg.pre,
            recovery_trigger: msg.rec,
            tank_height_cm: msg.h_cm,
        })),
        _ => Err(DecodeError::UnknownCommand),
    }
}

/// Encode a status snapshot as a single JSON object (no terminator).
pub fn encode_status(status: &TelemetryData) -> Result<Vec<u8, MAX_STATUS>, DecodeError> {
    let json = serde_json::to_vec(status).map_err(|_| DecodeError::Encode)?;
    Vec::from_slice(&json).map_err(|()| DecodeError::Encode)
}

/// Splits a byte stream into `\n`-terminated lines.
///
/// A line longer than [`MAX_LINE`] is discarded up to its terminator.
/// `\r` is stripped so CRLF peers work unchanged.
pub struct LineDecoder {
    buf: Vec<u8, MAX_LINE>,
    overflowed: bool,
    complete: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
            complete: false,
        }
    }

    /// Feed one byte.  Returns the completed line when `byte` ends one.
    /// The slice is valid until the next call.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if core::mem::take(&mut self.complete) {
            self.buf.clear();
        }
        match byte {
            b'\n' => {
                if core::mem::take(&mut self.overflowed) || self.buf.is_empty() {
                    self.buf.clear();
                    return None;
                }
                self.complete = true;
                Some(self.buf.as_slice())
            }
            b'\r' => None,
            _ if self.overflowed => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.buf.clear();
                    self.overflowed = true;
                }
                None
            }
        }
    }
}
