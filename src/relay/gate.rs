//! Inbound rate limiting.
//!
//! A `burster` token bucket in front of the decoder.  A peer flooding the
//! link gets its excess frames dropped before they cost a JSON parse or
//! a mailbox slot.

use core::time::Duration;

use burster::Limiter;

/// Frames accepted back-to-back.
pub const BURST: u64 = 5;
/// Sustained frames per second.
pub const PER_SECOND: u64 = 2;

pub struct CommandGate {
    bucket: burster::TokenBucket<fn() -> Duration>,
}

impl Default for CommandGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandGate {
    pub fn new() -> Self {
        Self::with_clock(crate::adapters::time::monotonic)
    }

    /// Build a gate that reads time from `now`.
    pub fn with_clock(now: fn() -> Duration) -> Self {
        Self {
            bucket: burster::TokenBucket::new_with_time_provider(PER_SECOND, BURST, now),
        }
    }

    /// Spend one token.  `false` means the frame should be dropped.
    pub fn admit(&mut self) -> bool {
        self.bucket.try_consume(1).is_ok()
    }
}
