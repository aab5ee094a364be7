//! Non-blocking buzzer pattern engine.
//!
//! Beep requests are queued and played back by [`Buzzer::tick`], which the
//! main loop calls every few milliseconds with the time since the previous
//! call.  A pattern of `times` beeps of `duration_ms` is played as
//! alternating on/off phases of equal length; consecutive patterns are
//! separated by [`PATTERN_GAP_MS`] of silence.
//!
//! ```text
//!  beep(2, 200):  ▇▇▇▇____▇▇▇▇____········  next pattern
//!                 200 200 200 200  gap
//! ```

use embedded_hal::digital::OutputPin;
use heapless::Deque;
use log::{debug, warn};

use crate::control::pump::Beep;
use crate::error::ActuatorError;

/// Silence between two queued patterns.
pub const PATTERN_GAP_MS: u32 = 300;
const QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    On { left_ms: u32 },
    Off { left_ms: u32 },
    Gap { left_ms: u32 },
}

impl Phase {
    fn shortened(self, by_ms: u32) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::On { left_ms } => Self::On {
                left_ms: left_ms - by_ms,
            },
            Self::Off { left_ms } => Self::Off {
                left_ms: left_ms - by_ms,
            },
            Self::Gap { left_ms } => Self::Gap {
                left_ms: left_ms - by_ms,
            },
        }
    }
}

pub struct Buzzer<P: OutputPin> {
    pin: P,
    queue: Deque<Beep, QUEUE_DEPTH>,
    phase: Phase,
    /// Pattern currently playing and beeps still owed after this one.
    current: Option<Beep>,
    remaining: u8,
}

impl<P: OutputPin> Buzzer<P> {
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("buzzer: initial LOW write failed");
        }
        Self {
            pin,
            queue: Deque::new(),
            phase: Phase::Idle,
            current: None,
            remaining: 0,
        }
    }

    /// Queue a pattern.  Returns `false` if the queue was full and the
    /// pattern was dropped.
    pub fn queue(&mut self, beep: Beep) -> bool {
        if beep.times == 0 || beep.duration_ms == 0 {
            return true;
        }
        if self.queue.push_back(beep).is_err() {
            debug!("buzzer: queue full, dropping {:?}", beep);
            return false;
        }
        true
    }

    /// Advance playback by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: u32) -> Result<(), ActuatorError> {
        let mut budget = elapsed_ms;
        loop {
            match self.phase {
                Phase::Idle => {
                    let Some(next) = self.queue.pop_front() else {
                        return Ok(());
                    };
                    self.current = Some(next);
                    self.remaining = next.times - 1;
                    self.enter_on(next)?;
                }
                Phase::On { left_ms } | Phase::Off { left_ms } | Phase::Gap { left_ms }
                    if budget < left_ms =>
                {
                    self.phase = self.phase.shortened(budget);
                    return Ok(());
                }
                Phase::On { left_ms } => {
                    budget -= left_ms;
                    self.pin
                        .set_low()
                        .map_err(|_| ActuatorError::BuzzerWriteFailed)?;
                    let dur = self.current.map_or(0, |b| u32::from(b.duration_ms));
                    self.phase = if self.remaining > 0 {
                        Phase::Off { left_ms: dur }
                    } else {
                        self.current = None;
                        Phase::Gap {
                            left_ms: PATTERN_GAP_MS,
                        }
                    };
                }
                Phase::Off { left_ms } => {
                    budget -= left_ms;
                    self.remaining -= 1;
                    match self.current {
                        Some(b) => self.enter_on(b)?,
                        None => self.phase = Phase::Idle,
                    }
                }
                Phase::Gap { left_ms } => {
                    budget -= left_ms;
                    self.phase = Phase::Idle;
                    if self.queue.is_empty() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// True while a pattern is sounding or waiting in the queue.
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Gap { .. }) || !self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    fn enter_on(&mut self, beep: Beep) -> Result<(), ActuatorError> {
        self.pin
            .set_high()
            .map_err(|_| ActuatorError::BuzzerWriteFailed)?;
        self.phase = Phase::On {
            left_ms: u32::from(beep.duration_ms),
        };
        Ok(())
    }
}
