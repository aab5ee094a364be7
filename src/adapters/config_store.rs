//! Persistent pump configuration on top of a [`StoragePort`].
//!
//! Every [`PumpConfig`] field is its own key in the `tankcfg` namespace,
//! stored as little-endian bytes:
//!
//! | Key     | Field                | Type | Default |
//! |---------|----------------------|------|---------|
//! | `on`    | `pump_on_level`      | u8   | 20      |
//! | `off`   | `pump_off_level`     | u8   | 90      |
//! | `pre`   | `pre_schedule_limit` | u8   | 65      |
//! | `rec`   | `recovery_trigger`   | u8   | 70      |
//! | `sched` | `schedules_enabled`  | u8   | 1       |
//! | `h_cm`  | `tank_height_cm`     | u16  | 100     |
//!
//! A key that is missing, unreadable or the wrong size loads as its
//! default.  A loaded set that breaks the cross-field invariants is
//! discarded whole in favour of [`PumpConfig::default`].

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::PumpConfig;

pub const NAMESPACE: &str = "tankcfg";

pub const KEY_ON: &str = "on";
pub const KEY_OFF: &str = "off";
pub const KEY_PRE: &str = "pre";
pub const KEY_REC: &str = "rec";
pub const KEY_SCHED: &str = "sched";
pub const KEY_HEIGHT: &str = "h_cm";

pub struct ConfigStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn get<const N: usize>(&self, key: &str) -> Option<[u8; N]> {
        let mut buf = [0u8; N];
        match self.storage.read(NAMESPACE, key, &mut buf) {
            Ok(n) if n == N => Some(buf),
            Ok(n) => {
                warn!("ConfigStore: '{}' has {} bytes, expected {}", key, n, N);
                None
            }
            Err(StorageError::NotFound) => {
                info!("ConfigStore: '{}' not set, using default", key);
                None
            }
            Err(e) => {
                warn!("ConfigStore: '{}' read failed ({}), using default", key, e);
                None
            }
        }
    }

    fn get_u8(&self, key: &str, default: u8) -> u8 {
        self.get::<1>(key).map_or(default, u8::from_le_bytes)
    }

    fn get_u16(&self, key: &str, default: u16) -> u16 {
        self.get::<2>(key).map_or(default, u16::from_le_bytes)
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get::<1>(key).map_or(default, |[b]| b != 0)
    }

    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<(), ConfigError> {
        self.storage.write(NAMESPACE, key, bytes).map_err(|e| {
            warn!("ConfigStore: '{}' write failed ({})", key, e);
            ConfigError::IoError
        })
    }
}

impl<S: StoragePort> ConfigPort for ConfigStore<S> {
    fn load(&self) -> Result<PumpConfig, ConfigError> {
        let d = PumpConfig::default();
        let cfg = PumpConfig {
            pump_on_level: self.get_u8(KEY_ON, d.pump_on_level),
            pump_off_level: self.get_u8(KEY_OFF, d.pump_off_level),
            pre_schedule_limit: self.get_u8(KEY_PRE, d.pre_schedule_limit),
            recovery_trigger: self.get_u8(KEY_REC, d.recovery_trigger),
            schedules_enabled: self.get_bool(KEY_SCHED, d.schedules_enabled),
            tank_height_cm: self.get_u16(KEY_HEIGHT, d.tank_height_cm),
            ..d
        };

        if let Err(reason) = cfg.validate() {
            warn!("ConfigStore: stored config invalid ({}), using defaults", reason);
            return Ok(d);
        }
        info!(
            "ConfigStore: loaded on={} off={} pre={} rec={} sched={} h={}cm",
            cfg.pump_on_level,
            cfg.pump_off_level,
            cfg.pre_schedule_limit,
            cfg.recovery_trigger,
            cfg.schedules_enabled,
            cfg.tank_height_cm
        );
        Ok(cfg)
    }

    fn save(&mut self, config: &PumpConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;

        self.put(KEY_ON, &config.pump_on_level.to_le_bytes())?;
        self.put(KEY_OFF, &config.pump_off_level.to_le_bytes())?;
        self.put(KEY_PRE, &config.pre_schedule_limit.to_le_bytes())?;
        self.put(KEY_REC, &config.recovery_trigger.to_le_bytes())?;
        self.put(KEY_SCHED, &[u8::from(config.schedules_enabled)])?;
        self.put(KEY_HEIGHT, &config.tank_height_cm.to_le_bytes())?;

        info!("ConfigStore: config saved");
        Ok(())
    }
}
