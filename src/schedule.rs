//! Daily fill-window schedule.
//!
//! The tank is topped up in short windows at fixed hours of the day. The
//! hour before each window uses a lowered stop threshold so the window
//! has headroom to fill.
//!
//! ```text
//!  hour:   07        08        09 ...  13        14 ...  19        20
//!          ├─ pre ───┼─ window ┤       ├─ pre ───┼─ window  ├─ pre ───┼─ window
//!                    └ 10 min ┘                  └ 10 min          └ 10 min
//! ```

/// Wall-clock reading supplied by the clock port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    /// Day counter (day-of-year or any value that changes at midnight).
    pub day: u16,
    /// Hour of day (0–23).
    pub hour: u8,
    /// Minute of hour (0–59).
    pub minute: u8,
}

impl WallTime {
    pub const fn new(day: u16, hour: u8, minute: u8) -> Self {
        Self { day, hour, minute }
    }
}

/// Default slot hours, ascending.
pub const DEFAULT_SLOTS: [u8; 3] = [8, 14, 20];
/// Length of each fill window from the top of the slot hour.
pub const WINDOW_MINUTES: u8 = 10;
/// A window finding the tank at or above this level is skipped.
pub const SKIP_CEILING_PERCENT: f32 = 85.0;

/// Fixed, ordered set of fill slots.
#[derive(Debug, Clone, Copy)]
pub struct FillSchedule {
    slots: [u8; 3],
}

impl Default for FillSchedule {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
        }
    }
}

impl FillSchedule {
    /// Slot hours in ascending order.
    pub fn slots(&self) -> &[u8] {
        &self.slots
    }

    /// True while `now` is inside the window of `slot`.
    pub fn in_window(&self, slot: u8, now: WallTime) -> bool {
        now.hour == slot && now.minute < WINDOW_MINUTES
    }

    /// True when `hour` is the hour right before any slot.
    pub fn is_pre_schedule_hour(&self, hour: u8) -> bool {
        self.slots.iter().any(|&s| s.checked_sub(1) == Some(hour))
    }

    /// True when a window finding the tank at `fill` needs no top-up.
    pub fn full_enough(fill: f32) -> bool {
        fill > SKIP_CEILING_PERCENT
    }
}
