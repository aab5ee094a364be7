//! JSN-SR04T waterproof ultrasonic distance sensor.
//!
//! A 10 µs trigger pulse starts a ping; the echo pin stays HIGH for the
//! round-trip time of flight.  Three pings are taken per read and the
//! median is returned, which rejects single-ping reflections off the tank
//! wall.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the trigger pin and times the echo via hw_init helpers.
//! On host/test: reads from a static `AtomicU32` for injection.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::SensorError;

/// Injected echo width in microseconds; `u32::MAX` simulates a timeout.
static SIM_ECHO_US: AtomicU32 = AtomicU32::new(2_900);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_distance_cm(cm: Option<f32>) {
    let us = cm.map_or(u32::MAX, |d| (d * US_PER_CM) as u32);
    SIM_ECHO_US.store(us, Ordering::Relaxed);
}

/// Round-trip echo time per centimetre of distance.
const US_PER_CM: f32 = 58.0;
/// No echo within this window means no target in range.
const ECHO_TIMEOUT_US: u32 = 30_000;
/// Blind zone of the transducer.
const MIN_RANGE_CM: f32 = 2.0;
/// Rated range of the JSN-SR04T.
const MAX_RANGE_CM: f32 = 400.0;
const PINGS_PER_READ: usize = 3;

pub struct DistanceSensor {
    _trig_gpio: i32,
    _echo_gpio: i32,
}

impl DistanceSensor {
    pub fn new(trig_gpio: i32, echo_gpio: i32) -> Self {
        Self {
            _trig_gpio: trig_gpio,
            _echo_gpio: echo_gpio,
        }
    }

    /// Median of three pings, in centimetres.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let mut samples = [0.0_f32; PINGS_PER_READ];
        for s in &mut samples {
            *s = self.ping()?;
        }
        samples.sort_by(f32::total_cmp);
        Ok(samples[PINGS_PER_READ / 2])
    }

    fn ping(&mut self) -> Result<f32, SensorError> {
        let us = self.echo_width_us();
        if us >= ECHO_TIMEOUT_US {
            return Err(SensorError::EchoTimeout);
        }
        let cm = us as f32 / US_PER_CM;
        if !(MIN_RANGE_CM..=MAX_RANGE_CM).contains(&cm) {
            return Err(SensorError::OutOfRange);
        }
        Ok(cm)
    }

    #[cfg(target_os = "espidf")]
    fn echo_width_us(&mut self) -> u32 {
        crate::drivers::hw_init::ultrasonic_ping_us(ECHO_TIMEOUT_US)
    }

    #[cfg(not(target_os = "espidf"))]
    fn echo_width_us(&mut self) -> u32 {
        SIM_ECHO_US.load(Ordering::Relaxed)
    }
}
