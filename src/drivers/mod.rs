//! Actuator drivers, hardware initialisation, and peripheral helpers.
//!
//! Drivers are generic over `embedded_hal::digital::OutputPin`.  On
//! ESP-IDF they wrap `esp_idf_hal` pin drivers; on the host they wrap
//! [`SimPin`].

pub mod buzzer;
pub mod hw_init;
pub mod relay;

use core::cell::Cell;

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin};

/// In-memory output pin for host builds and tests.
#[derive(Debug, Default)]
pub struct SimPin {
    high: bool,
    writes: u32,
    fail: Cell<bool>,
}

/// Write error injected with [`SimPin::sim_fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinFault;

impl Error for SimPinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Number of successful level writes since construction.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Make every subsequent write fail and leave the level untouched.
    pub fn sim_fail(&self, fail: bool) {
        self.fail.set(fail);
    }

    fn drive(&mut self, high: bool) -> Result<(), SimPinFault> {
        if self.fail.get() {
            return Err(SimPinFault);
        }
        self.high = high;
        self.writes += 1;
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinFault;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}
