//! Inbound commands to the application service.
//!
//! These represent actions requested by the relay server and decoded by
//! [`relay::codec`](crate::relay::codec). The
//! [`AppService`](super::service::AppService) interprets and acts upon them.

use crate::config::SettingsPatch;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Force the pump on and enter manual mode.
    PumpOn,

    /// Force the pump off and enter manual mode.
    PumpOff,

    /// Leave manual mode; the automatic policy governs from the next tick.
    Auto,

    /// Update the fields present in the patch and persist the result.
    Settings(SettingsPatch),
}
