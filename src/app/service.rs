//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the [`PumpController`] and applies its decisions
//! to the outside world.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!   ClockPort ──▶ │       AppService        │ ──▶ ConfigPort
//! ActuatorPort ◀──│     PumpController      │
//! FeedbackPort ◀──└────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::{PumpConfig, SettingsPatch};
use crate::control::pump::{BEEP_SETTINGS, Outcome, PumpController};
use crate::error::Error;

use super::commands::AppCommand;
use super::events::{AppEvent, Mode, SettingsEcho, TelemetryData};
use super::ports::{ActuatorPort, ClockPort, ConfigPort, EventSink, FeedbackPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    controller: PumpController,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from the configuration loaded at boot.
    pub fn new(config: PumpConfig) -> Self {
        Self {
            controller: PumpController::new(config),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the relay to the initial (off) state and announce startup.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.set_pump(self.controller.pump_on());
        sink.emit(&AppEvent::Started {
            pump_on: self.controller.pump_on(),
        });
        info!("AppService started, config {:?}", self.controller.config());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one sampling tick: read sensors → evaluate policy → actuators.
    ///
    /// Returns the status snapshot to forward upstream.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort + FeedbackPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> TelemetryData {
        self.tick_count += 1;

        // 1. Read sensors via SensorPort (invalid reads hold the last value)
        let fill = self.controller.read_fill(hw.read_distance_cm());
        self.controller.read_temperature(hw.read_temperature_c());

        // 2. Policy
        let was_on = self.controller.pump_on();
        let outcome = self.controller.evaluate(fill, clock.now());

        // 3. Apply via ActuatorPort / FeedbackPort
        self.apply(&outcome, Some(was_on), hw, sink);

        self.status()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a remote command.
    ///
    /// Settings are persisted before this returns and the confirmation
    /// beep only plays once they are stored.  A storage failure is
    /// reported but the new settings stay live.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl ActuatorPort + FeedbackPort),
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        if let AppCommand::Settings(patch) = cmd {
            self.apply_settings(&patch, hw, store, sink);
            return;
        }

        let was_manual = self.controller.is_manual();
        let outcome = self.controller.apply_command(&cmd);
        self.apply(&outcome, None, hw, sink);

        if self.controller.is_manual() != was_manual {
            sink.emit(&AppEvent::ModeChanged(self.mode()));
        }
    }

    fn apply_settings(
        &mut self,
        patch: &SettingsPatch,
        hw: &mut impl FeedbackPort,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        if let Err(reason) = self.controller.apply_settings(patch) {
            warn!("SETTINGS rejected: {}", reason);
            sink.emit(&AppEvent::SettingsRejected(reason));
            return;
        }

        let cfg = *self.controller.config();
        match store.save(&cfg) {
            Ok(()) => {
                sink.emit(&AppEvent::SettingsSaved(cfg));
                hw.beep(BEEP_SETTINGS.times, BEEP_SETTINGS.duration_ms);
            }
            Err(e) => {
                warn!("Settings persist failed: {}", Error::from(e));
                sink.emit(&AppEvent::ConfigSaveFailed);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build the status snapshot from the current state.
    pub fn status(&self) -> TelemetryData {
        let state = self.controller.state();
        TelemetryData {
            level: state.last_fill_percent.round().clamp(0.0, 100.0) as u8,
            pump: state.pump_on,
            temp: state.last_temperature_c,
            mode: self.mode(),
            settings: SettingsEcho::from(self.controller.config()),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.controller.is_manual() {
            Mode::Manual
        } else {
            Mode::Auto
        }
    }

    pub fn config(&self) -> &PumpConfig {
        self.controller.config()
    }

    pub fn controller(&self) -> &PumpController {
        &self.controller
    }

    pub fn pump_on(&self) -> bool {
        self.controller.pump_on()
    }

    pub fn is_manual(&self) -> bool {
        self.controller.is_manual()
    }

    pub fn recovery_pending(&self) -> bool {
        self.controller.recovery_pending()
    }

    /// Total sampling ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate an outcome into port calls.
    ///
    /// With `was_on` set, the relay is only written when the final state
    /// differs from it, so an ON→OFF pair inside one tick does not click
    /// the relay.  Commands pass `None` and always write.
    fn apply(
        &self,
        outcome: &Outcome,
        was_on: Option<bool>,
        hw: &mut (impl ActuatorPort + FeedbackPort),
        sink: &mut impl EventSink,
    ) {
        if let Some(last) = outcome.changes.last() {
            for c in &outcome.changes[..outcome.changes.len() - 1] {
                debug!("pump {} ({:?}) superseded within tick", on_off(c.on), c.reason);
            }
            if was_on != Some(last.on) {
                hw.set_pump(last.on);
                info!("Pump {} ({:?})", on_off(last.on), last.reason);
                sink.emit(&AppEvent::PumpChanged {
                    on: last.on,
                    reason: last.reason,
                });
            }
        }
        for b in &outcome.feedback {
            hw.beep(b.times, b.duration_ms);
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
