//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | level={}% | pump={} | T={:.1}\u{00b0}C | mode={:?} | \
                     on={} off={} pre={} rec={} sched={} h={}cm",
                    t.level,
                    if t.pump { "ON" } else { "OFF" },
                    t.temp,
                    t.mode,
                    t.settings.min,
                    t.settings.max,
                    t.settings.pre,
                    t.settings.rec,
                    t.settings.sched,
                    t.settings.h_cm,
                );
            }
            AppEvent::PumpChanged { on, reason } => {
                info!("PUMP  | {} reason={:?}", if *on { "ON" } else { "OFF" }, reason);
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE  | {:?}", mode);
            }
            AppEvent::SettingsSaved(cfg) => {
                info!(
                    "CONF  | saved on={} off={} pre={} rec={} sched={} h={}cm",
                    cfg.pump_on_level,
                    cfg.pump_off_level,
                    cfg.pre_schedule_limit,
                    cfg.recovery_trigger,
                    cfg.schedules_enabled,
                    cfg.tank_height_cm,
                );
            }
            AppEvent::SettingsRejected(reason) => {
                warn!("CONF  | rejected: {}", reason);
            }
            AppEvent::ConfigSaveFailed => {
                warn!("CONF  | save failed, running on unsaved settings");
            }
            AppEvent::Started { pump_on } => {
                info!("START | pump={}", if *pump_on { "ON" } else { "OFF" });
            }
        }
    }
}
