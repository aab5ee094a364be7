//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the pump relay and the buzzer, exposing them
//! through [`SensorPort`], [`ActuatorPort`] and [`FeedbackPort`].  This is
//! the only module in the system that touches actual hardware.  On
//! non-espidf targets the drivers run on simulation backends.

use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::ports::{ActuatorPort, FeedbackPort, SensorPort};
use crate::control::pump::Beep;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::relay::RelayDriver;
use crate::error::Error;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R: OutputPin, B: OutputPin> {
    sensor_hub: SensorHub,
    relay: RelayDriver<R>,
    buzzer: Buzzer<B>,
}

impl<R: OutputPin, B: OutputPin> HardwareAdapter<R, B> {
    pub fn new(sensor_hub: SensorHub, relay: RelayDriver<R>, buzzer: Buzzer<B>) -> Self {
        Self {
            sensor_hub,
            relay,
            buzzer,
        }
    }

    /// Advance buzzer playback.  Call from the main loop's fast sub-tick.
    pub fn tick_feedback(&mut self, elapsed_ms: u32) {
        if let Err(e) = self.buzzer.tick(elapsed_ms) {
            warn!("{}", Error::from(e));
        }
    }

    /// Retry a relay write that failed earlier.  Call once per sampling
    /// tick; a no-op while the relay is in sync.
    pub fn resync_relay(&mut self) {
        match self.relay.retry() {
            Ok(true) => {
                let state = if self.relay.is_on() { "ON" } else { "OFF" };
                info!("relay resynced, now {}", state);
            }
            Ok(false) => {}
            Err(e) => debug!("{} (retrying next tick)", Error::from(e)),
        }
    }

    pub fn relay(&self) -> &RelayDriver<R> {
        &self.relay
    }

    pub fn buzzer(&self) -> &Buzzer<B> {
        &self.buzzer
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<R: OutputPin, B: OutputPin> SensorPort for HardwareAdapter<R, B> {
    fn read_distance_cm(&mut self) -> Option<f32> {
        self.sensor_hub.distance_cm()
    }

    fn read_temperature_c(&mut self) -> Option<f32> {
        self.sensor_hub.temperature_c()
    }
}

// ── ActuatorPort / FeedbackPort implementation ────────────────

impl<R: OutputPin, B: OutputPin> ActuatorPort for HardwareAdapter<R, B> {
    fn set_pump(&mut self, on: bool) {
        if let Err(e) = self.relay.set(on) {
            warn!("{} (relay stays {})", Error::from(e), self.relay.is_on());
        }
    }
}

impl<R: OutputPin, B: OutputPin> FeedbackPort for HardwareAdapter<R, B> {
    fn beep(&mut self, times: u8, duration_ms: u16) {
        self.buzzer.queue(Beep::new(times, duration_ms));
    }
}
