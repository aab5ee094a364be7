//! Pump control policy: the automatic/manual state machine.
//!
//! [`PumpController`] owns the persisted [`PumpConfig`] and the volatile
//! [`RuntimeState`]. It is pure: every operation returns an [`Outcome`]
//! describing actuator changes and feedback, and the caller applies it
//! through the actuator and feedback ports.
//!
//! Per-tick evaluation order (later steps see earlier effects):
//!
//! ```text
//!  manual? ──yes──▶ hold
//!    │no
//!    ▼
//!  day rollover ─▶ slot windows / missed slots ─▶ start logic ─▶ stop logic
//! ```

use heapless::Vec;
use log::{debug, info};

use crate::app::commands::AppCommand;
use crate::config::{PumpConfig, SettingsPatch};
use crate::schedule::{FillSchedule, WallTime};

/// Fill level at which a pending recovery counts as complete.
pub const RECOVERY_CLEAR_PERCENT: f32 = 90.0;

// ───────────────────────────────────────────────────────────────
// Outcome types
// ───────────────────────────────────────────────────────────────

/// One feedback request: beep `times` times, each `duration_ms` long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beep {
    pub times: u8,
    pub duration_ms: u16,
}

impl Beep {
    pub const fn new(times: u8, duration_ms: u16) -> Self {
        Self { times, duration_ms }
    }
}

/// Remote command acknowledgement.
pub const BEEP_MANUAL: Beep = Beep::new(1, 100);
/// Back to automatic mode.
pub const BEEP_AUTO: Beep = Beep::new(2, 50);
/// Settings stored.
pub const BEEP_SETTINGS: Beep = Beep::new(3, 100);
/// Normal or scheduled start.
pub const BEEP_START: Beep = Beep::new(1, 500);
/// Recovery start.
pub const BEEP_RECOVERY: Beep = Beep::new(3, 200);
/// Automatic stop.
pub const BEEP_STOP: Beep = Beep::new(2, 200);

/// Why the pump changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpReason {
    /// Remote PUMP_ON / PUMP_OFF.
    Manual,
    /// Level dropped to the start threshold.
    LowLevel,
    /// A fill window opened.
    Scheduled,
    /// Catch-up start after a missed window.
    Recovery,
    /// Level reached the stop threshold.
    Full,
    /// Level reached the lowered pre-window stop threshold.
    PreScheduleLimit,
}

/// A single commanded actuator transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpChange {
    pub on: bool,
    pub reason: PumpReason,
}

/// Result of one controller operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Actuator transitions in the order they were decided.
    pub changes: Vec<PumpChange, 3>,
    /// Feedback requests in the order they were raised.
    pub feedback: Vec<Beep, 4>,
}

impl Outcome {
    /// Final commanded pump state if anything changed.
    pub fn final_pump(&self) -> Option<bool> {
        self.changes.last().map(|c| c.on)
    }

    fn change(&mut self, on: bool, reason: PumpReason, beep: Beep) {
        // Capacities cover the longest path through one operation.
        let _ = self.changes.push(PumpChange { on, reason });
        self.beep(beep);
    }

    fn beep(&mut self, beep: Beep) {
        let _ = self.feedback.push(beep);
    }
}

// ───────────────────────────────────────────────────────────────
// Runtime state
// ───────────────────────────────────────────────────────────────

/// Volatile controller state. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuntimeState {
    /// Remote operator has explicit control.
    pub manual_mode: bool,
    /// Current commanded actuator state.
    pub pump_on: bool,
    /// A fill window passed without being run or skipped.
    pub recovery_pending: bool,
    /// Day of the last resolved slot (`None` before the first clock reading).
    pub last_schedule_day: Option<u16>,
    /// Last slot hour resolved today (`None` = nothing resolved yet).
    pub last_schedule_hour: Option<u8>,
    /// Most recent valid fill percentage.
    pub last_fill_percent: f32,
    /// Most recent valid temperature.
    pub last_temperature_c: f32,
}

// ───────────────────────────────────────────────────────────────
// PumpController
// ───────────────────────────────────────────────────────────────

pub struct PumpController {
    config: PumpConfig,
    state: RuntimeState,
    schedule: FillSchedule,
}

impl PumpController {
    pub fn new(config: PumpConfig) -> Self {
        Self {
            config,
            state: RuntimeState::default(),
            schedule: FillSchedule::default(),
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// Apply a decoded remote command.
    ///
    /// `Settings` patches that break the config invariants are rejected:
    /// the config is left as-is and the returned outcome is empty.
    pub fn apply_command(&mut self, cmd: &AppCommand) -> Outcome {
        let mut out = Outcome::default();
        match cmd {
            AppCommand::PumpOn => {
                self.state.manual_mode = true;
                self.state.pump_on = true;
                out.change(true, PumpReason::Manual, BEEP_MANUAL);
            }
            AppCommand::PumpOff => {
                self.state.manual_mode = true;
                self.state.pump_on = false;
                out.change(false, PumpReason::Manual, BEEP_MANUAL);
            }
            AppCommand::Auto => {
                self.state.manual_mode = false;
                out.beep(BEEP_AUTO);
            }
            AppCommand::Settings(patch) => {
                if self.apply_settings(patch).is_ok() {
                    out.beep(BEEP_SETTINGS);
                }
            }
        }
        out
    }

    /// Validate and adopt a settings patch.
    pub fn apply_settings(&mut self, patch: &SettingsPatch) -> Result<(), &'static str> {
        let next = self.config.patched(patch);
        next.validate()?;
        info!("Settings applied: {:?}", next);
        self.config = next;
        Ok(())
    }

    // ── Sensor conversion ─────────────────────────────────────

    /// Convert a raw distance into a fill percentage.
    ///
    /// Missing, non-finite or non-positive readings return the previous
    /// fill level unchanged.
    pub fn read_fill(&mut self, raw_distance_cm: Option<f32>) -> f32 {
        let Some(d) = raw_distance_cm.filter(|d| d.is_finite() && *d > 0.0) else {
            debug!("distance invalid, holding {:.1}%", self.state.last_fill_percent);
            return self.state.last_fill_percent;
        };
        let empty = f32::from(self.config.tank_height_cm.saturating_add(self.config.sensor_gap_cm));
        let full = f32::from(self.config.sensor_gap_cm);
        let pct = linear_map(d, empty, full, 0.0, 100.0).clamp(0.0, 100.0);
        self.state.last_fill_percent = pct;
        pct
    }

    /// Hold-over filter for the temperature reading.
    pub fn read_temperature(&mut self, raw_c: Option<f32>) -> f32 {
        if let Some(t) = raw_c.filter(|t| t.is_finite()) {
            self.state.last_temperature_c = t;
        }
        self.state.last_temperature_c
    }

    // ── Per-tick policy ───────────────────────────────────────

    /// Run the policy once. `now` is `None` when the clock is unavailable,
    /// which disables schedule and recovery matching for this tick.
    pub fn evaluate(&mut self, fill: f32, now: Option<WallTime>) -> Outcome {
        let mut out = Outcome::default();

        // 1. Manual override suppresses everything.
        if self.state.manual_mode {
            return out;
        }

        if let Some(now) = now {
            // 2. Day rollover.
            if self.state.last_schedule_day != Some(now.day) {
                self.state.last_schedule_day = Some(now.day);
                self.state.last_schedule_hour = None;
            }

            // 3. Fill windows and missed-window detection.
            if self.config.schedules_enabled {
                self.check_slots(fill, now, &mut out);
            }
        }

        // 4. Start logic.
        if !self.state.pump_on {
            if fill <= f32::from(self.config.pump_on_level) {
                self.state.pump_on = true;
                out.change(true, PumpReason::LowLevel, BEEP_START);
            } else if self.state.recovery_pending
                && fill <= f32::from(self.config.recovery_trigger)
            {
                self.state.pump_on = true;
                out.change(true, PumpReason::Recovery, BEEP_RECOVERY);
            }
        }

        // 5. Stop logic.
        if self.state.pump_on {
            let pre = now.is_some_and(|t| self.schedule.is_pre_schedule_hour(t.hour));
            let (threshold, reason) = if pre {
                (self.config.pre_schedule_limit, PumpReason::PreScheduleLimit)
            } else {
                (self.config.pump_off_level, PumpReason::Full)
            };
            if fill >= f32::from(threshold) {
                self.state.pump_on = false;
                out.change(false, reason, BEEP_STOP);
                if fill >= RECOVERY_CLEAR_PERCENT {
                    self.state.recovery_pending = false;
                }
            }
        }

        out
    }

    fn check_slots(&mut self, fill: f32, now: WallTime, out: &mut Outcome) {
        for &slot in self.schedule.slots() {
            if self.schedule.in_window(slot, now) && self.state.last_schedule_hour != Some(slot) {
                if !FillSchedule::full_enough(fill) && !self.state.pump_on {
                    self.state.pump_on = true;
                    out.change(true, PumpReason::Scheduled, BEEP_START);
                } else {
                    debug!("slot {slot}:00 skipped at {fill:.1}%");
                }
                self.state.last_schedule_hour = Some(slot);
            } else if now.hour > slot && self.state.last_schedule_hour < Some(slot) {
                // Re-fires every tick until the day rolls over.
                self.state.recovery_pending = true;
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn is_manual(&self) -> bool {
        self.state.manual_mode
    }

    pub fn pump_on(&self) -> bool {
        self.state.pump_on
    }

    pub fn recovery_pending(&self) -> bool {
        self.state.recovery_pending
    }

    pub fn last_schedule_hour(&self) -> Option<u8> {
        self.state.last_schedule_hour
    }
}

/// Arduino-style linear map of `x` from `[in_lo, in_hi]` to `[out_lo, out_hi]`.
pub fn linear_map(x: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    if (in_hi - in_lo).abs() < f32::EPSILON {
        return out_lo;
    }
    (x - in_lo) * (out_hi - out_lo) / (in_hi - in_lo) + out_lo
}
