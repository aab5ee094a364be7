//! Relay link: framing, admission and decoding on top of a [`Transport`].

use log::{debug, warn};

use crate::app::events::TelemetryData;
use crate::error::{DecodeError, Error};

use super::codec::{LineDecoder, decode_command, encode_status};
use super::gate::CommandGate;
use super::mailbox::CommandMailbox;
use super::transport::Transport;

/// Read chunk size; also bounds the bytes consumed per `poll`.
const CHUNK: usize = 64;
const MAX_CHUNKS_PER_POLL: usize = 8;

/// Counters for frames that never reached the mailbox.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub accepted: u32,
    pub rate_limited: u32,
    pub undecodable: u32,
    pub mailbox_full: u32,
}

pub struct RelayLink<T: Transport> {
    transport: T,
    decoder: LineDecoder,
    gate: CommandGate,
    stats: LinkStats,
}

impl<T: Transport> RelayLink<T> {
    pub fn new(transport: T) -> Self {
        Self::with_gate(transport, CommandGate::new())
    }

    pub fn with_gate(transport: T, gate: CommandGate) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
            gate,
            stats: LinkStats::default(),
        }
    }

    /// Drain whatever the transport has buffered and post every decoded
    /// command to `mailbox`.  Never blocks.  Returns the number posted.
    pub fn poll(&mut self, mailbox: &CommandMailbox) -> usize {
        let mut posted = 0;
        let mut chunk = [0u8; CHUNK];
        for _ in 0..MAX_CHUNKS_PER_POLL {
            let n = match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("relay: read failed: {:?}", e);
                    break;
                }
            };
            for &byte in &chunk[..n] {
                let Some(line) = self.decoder.push(byte) else {
                    continue;
                };
                if !self.gate.admit() {
                    self.stats.rate_limited += 1;
                    debug!("relay: rate limited, frame dropped");
                    continue;
                }
                match decode_command(line) {
                    Ok(cmd) => {
                        if mailbox.post(cmd) {
                            self.stats.accepted += 1;
                            posted += 1;
                        } else {
                            self.stats.mailbox_full += 1;
                        }
                    }
                    Err(e) => {
                        self.stats.undecodable += 1;
                        debug!("relay: dropped frame ({})", Error::from(e));
                    }
                }
            }
        }
        posted
    }

    /// Encode `status` and write it as one line.
    pub fn send_status(&mut self, status: &TelemetryData) -> Result<(), DecodeError> {
        let mut line = encode_status(status)?;
        line.push(b'\n').map_err(|_| DecodeError::Encode)?;
        // One write per line keeps the frame and its terminator together.
        let sent = self
            .transport
            .write(&line)
            .and_then(|_| self.transport.flush());
        if let Err(e) = sent {
            warn!("relay: status write failed: {:?}", e);
        }
        Ok(())
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
