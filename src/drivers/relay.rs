//! Pump relay driver.
//!
//! Single-channel relay module switching the pump's mains supply.  The
//! driver knows only the coil polarity; all pump policy lives in
//! [`PumpController`](crate::control::pump::PumpController).

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::error::ActuatorError;

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    active_low: bool,
    on: bool,
    /// State whose write failed and still has to reach the pin.
    pending: Option<bool>,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Wrap `pin` and force the relay off.
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut relay = Self {
            pin,
            active_low,
            on: false,
            pending: None,
        };
        if relay.set(false).is_err() {
            warn!("relay: initial OFF write failed");
        }
        relay
    }

    /// Energise (`true`) or release the relay.
    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let level = PinState::from(on != self.active_low);
        if self.pin.set_state(level).is_err() {
            self.pending = Some(on);
            return Err(ActuatorError::RelayWriteFailed);
        }
        self.on = on;
        self.pending = None;
        Ok(())
    }

    /// Re-drive the last state whose write failed.  `Ok(true)` means the
    /// pin caught up on this call.
    pub fn retry(&mut self) -> Result<bool, ActuatorError> {
        match self.pending {
            Some(on) => self.set(on).map(|()| true),
            None => Ok(false),
        }
    }

    /// `false` while a failed write is waiting for [`retry`](Self::retry).
    pub fn is_synced(&self) -> bool {
        self.pending.is_none()
    }

    /// Last successfully commanded state.
    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
