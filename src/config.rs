//! System configuration parameters
//!
//! [`PumpConfig`] holds the persisted pump policy. It is loaded once at boot
//! through the config store and changed only by a remote `SETTINGS` command.
//! [`TimingConfig`] holds compile-time loop timing.

use serde::{Deserialize, Serialize};

/// Distance between the sensor face and the brim of a full tank.
pub const SENSOR_GAP_CM: u16 = 5;

/// Persisted pump policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpConfig {
    // --- Geometry ---
    /// Inner height of the tank (cm), brim to bottom.
    pub tank_height_cm: u16,
    /// Dead zone between the sensor and the brim (cm). Not persisted.
    #[serde(skip, default = "default_gap")]
    pub sensor_gap_cm: u16,

    // --- Thresholds (percent full) ---
    /// Start the pump at or below this level.
    pub pump_on_level: u8,
    /// Stop the pump at or above this level.
    pub pump_off_level: u8,
    /// Stop threshold used during the hour before a fill window.
    pub pre_schedule_limit: u8,
    /// Start threshold for recovery after a missed fill window.
    pub recovery_trigger: u8,

    // --- Schedule ---
    /// Whether the daily fill windows are active.
    pub schedules_enabled: bool,
}

fn default_gap() -> u16 {
    SENSOR_GAP_CM
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            tank_height_cm: 100,
            sensor_gap_cm: SENSOR_GAP_CM,
            pump_on_level: 20,
            pump_off_level: 90,
            pre_schedule_limit: 65,
            recovery_trigger: 70,
            schedules_enabled: true,
        }
    }
}

impl PumpConfig {
    /// Range-check every field and the cross-field invariants.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(10..=1000).contains(&self.tank_height_cm) {
            return Err("tank_height_cm must be 10–1000");
        }
        if self.pump_on_level > 100
            || self.pump_off_level > 100
            || self.pre_schedule_limit > 100
            || self.recovery_trigger > 100
        {
            return Err("levels must be 0–100");
        }
        if self.pump_on_level >= self.pump_off_level {
            return Err("pump_on_level must be < pump_off_level");
        }
        if self.recovery_trigger < self.pump_on_level {
            return Err("recovery_trigger must be >= pump_on_level");
        }
        Ok(())
    }

    /// Return a copy with every field present in `patch` overwritten.
    pub fn patched(&self, patch: &SettingsPatch) -> Self {
        Self {
            tank_height_cm: patch.tank_height_cm.unwrap_or(self.tank_height_cm),
            sensor_gap_cm: self.sensor_gap_cm,
            pump_on_level: patch.pump_on_level.unwrap_or(self.pump_on_level),
            pump_off_level: patch.pump_off_level.unwrap_or(self.pump_off_level),
            pre_schedule_limit: patch.pre_schedule_limit.unwrap_or(self.pre_schedule_limit),
            recovery_trigger: patch.recovery_trigger.unwrap_or(self.recovery_trigger),
            schedules_enabled: patch.schedules_enabled.unwrap_or(self.schedules_enabled),
        }
    }
}

/// Partial configuration update carried by a `SETTINGS` command.
/// `None` fields keep their previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub pump_on_level: Option<u8>,
    pub pump_off_level: Option<u8>,
    pub schedules_enabled: Option<bool>,
    pub pre_schedule_limit: Option<u8>,
    pub recovery_trigger: Option<u8>,
    pub tank_height_cm: Option<u16>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Main-loop timing.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Sampling tick period (milliseconds).
    pub sample_interval_ms: u32,
    /// Emit a status message every N ticks.
    pub telemetry_every_ticks: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            telemetry_every_ticks: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = PumpConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.pump_on_level < c.pump_off_level);
        assert!(c.recovery_trigger >= c.pump_on_level);
        assert!(c.pre_schedule_limit < c.pump_off_level);
    }

    #[test]
    fn rejects_on_above_off() {
        let c = PumpConfig {
            pump_on_level: 90,
            pump_off_level: 90,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_recovery_below_on() {
        let c = PumpConfig {
            pump_on_level: 30,
            recovery_trigger: 25,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_level_over_100() {
        let c = PumpConfig {
            pre_schedule_limit: 101,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let c = PumpConfig::default();
        let patch = SettingsPatch {
            pump_on_level: Some(25),
            ..Default::default()
        };
        let p = c.patched(&patch);
        assert_eq!(p.pump_on_level, 25);
        assert_eq!(p.pump_off_level, c.pump_off_level);
        assert_eq!(p.recovery_trigger, c.recovery_trigger);
        assert_eq!(p.schedules_enabled, c.schedules_enabled);
        assert_eq!(p.tank_height_cm, c.tank_height_cm);
    }

    #[test]
    fn serde_roundtrip_keeps_gap_constant() {
        let c = PumpConfig {
            pump_on_level: 30,
            ..Default::default()
        };
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("sensor_gap_cm"));
        let c2: PumpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }
}
