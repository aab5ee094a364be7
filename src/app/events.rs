//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to the relay
//! server, etc.

use serde::Serialize;

use crate::config::PumpConfig;
use crate::control::pump::PumpReason;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic status snapshot.
    Telemetry(TelemetryData),

    /// The pump relay was switched.
    PumpChanged { on: bool, reason: PumpReason },

    /// Manual / automatic mode changed.
    ModeChanged(Mode),

    /// A settings patch was adopted and persisted.
    SettingsSaved(PumpConfig),

    /// A settings patch broke a config invariant and was dropped.
    SettingsRejected(&'static str),

    /// The new settings are live but could not be persisted.
    ConfigSaveFailed,

    /// The application service has started.
    Started { pump_on: bool },
}

/// Control mode as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Manual,
    Auto,
}

/// Settings echo carried in every status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsEcho {
    pub min: u8,
    pub max: u8,
    pub sched: bool,
    pub pre: u8,
    pub rec: u8,
    pub h_cm: u16,
}

impl From<&PumpConfig> for SettingsEcho {
    fn from(c: &PumpConfig) -> Self {
        Self {
            min: c.pump_on_level,
            max: c.pump_off_level,
            sched: c.schedules_enabled,
            pre: c.pre_schedule_limit,
            rec: c.recovery_trigger,
            h_cm: c.tank_height_cm,
        }
    }
}

/// A point-in-time status snapshot; serialises to the relay status message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    /// Fill level, whole percent.
    pub level: u8,
    pub pump: bool,
    pub temp: f32,
    pub mode: Mode,
    pub settings: SettingsEcho,
}
