//! Inbound command mailbox.
//!
//! A bounded `embassy-sync` channel between whoever decodes relay frames
//! and the control loop that owns the [`AppService`](crate::app::service::AppService).
//! It is the single point where remote commands are serialised with the
//! per-tick evaluation.
//!
//! ```text
//! ┌────────────┐  AppCommand  ┌──────────────┐
//! │ relay link │────────────▶│ control loop  │
//! └────────────┘   depth 8    └──────────────┘
//! ```
//!
//! Delivery is at-most-once: when the mailbox is full the newest command
//! is dropped.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::AppCommand;

/// Channel depth for inbound commands.
pub const DEPTH: usize = 8;

pub struct CommandMailbox {
    channel: Channel<CriticalSectionRawMutex, AppCommand, DEPTH>,
}

/// Firmware-wide mailbox shared by the relay link and the control loop.
pub static MAILBOX: CommandMailbox = CommandMailbox::new();

impl Default for CommandMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandMailbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without blocking.  Returns `false` if the command was dropped.
    pub fn post(&self, cmd: AppCommand) -> bool {
        match self.channel.try_send(cmd) {
            Ok(()) => true,
            Err(_) => {
                warn!("mailbox full, dropping {:?}", cmd);
                false
            }
        }
    }

    /// Take the oldest pending command, if any.
    pub fn take(&self) -> Option<AppCommand> {
        self.channel.try_receive().ok()
    }

    /// Iterate over every command pending right now, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = AppCommand> + '_ {
        core::iter::from_fn(move || self.take())
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}
