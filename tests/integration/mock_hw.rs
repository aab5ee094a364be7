//! Mock hardware adapter for integration tests.
//!
//! Records every actuator and feedback call so tests can assert on the
//! full command history without touching real GPIO registers.

use std::collections::VecDeque;

use tankpump::app::events::AppEvent;
use tankpump::app::ports::{ActuatorPort, EventSink, FeedbackPort, SensorPort};
use tankpump::relay::transport::Transport;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    SetPump(bool),
    Beep { times: u8, duration_ms: u16 },
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Distance the next reads return; `None` simulates a failed read.
    pub distance_cm: Option<f32>,
    pub temperature_c: Option<f32>,
    pub calls: Vec<HwCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            distance_cm: None,
            temperature_c: Some(20.0),
            calls: Vec::new(),
        }
    }

    /// Place the water surface so the default 100 cm tank reads `pct`.
    pub fn set_fill(&mut self, pct: f32) {
        self.distance_cm = Some(105.0 - pct);
    }

    pub fn relay_writes(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::SetPump(on) => Some(*on),
                HwCall::Beep { .. } => None,
            })
            .collect()
    }

    pub fn beeps(&self) -> Vec<(u8, u16)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Beep { times, duration_ms } => Some((*times, *duration_ms)),
                HwCall::SetPump(_) => None,
            })
            .collect()
    }

    pub fn relay_on(&self) -> bool {
        self.relay_writes().last().copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_distance_cm(&mut self) -> Option<f32> {
        self.distance_cm
    }

    fn read_temperature_c(&mut self) -> Option<f32> {
        self.temperature_c
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) {
        self.calls.push(HwCall::SetPump(on));
    }
}

impl FeedbackPort for MockHardware {
    fn beep(&mut self, times: u8, duration_ms: u16) {
        self.calls.push(HwCall::Beep { times, duration_ms });
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn any(&self, pred: impl Fn(&AppEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedTransport ─────────────────────────────────────────

/// Transport that replays queued inbound chunks and records writes.
#[derive(Default)]
pub struct ScriptedTransport {
    pub inbound: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.inbound.push_back(bytes.to_vec());
    }

    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let Some(mut chunk) = self.inbound.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.inbound.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.written.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}
