//! Integration tests for the AppService → PumpController → ports pipeline.
//!
//! These run on the host (x86_64) and walk the pump policy through whole
//! days of sampling ticks and remote commands against mock adapters.

use super::mock_hw::{MockHardware, RecordingSink};

use tankpump::adapters::config_store::ConfigStore;
use tankpump::adapters::nvs::NvsStorage;
use tankpump::adapters::time::SimClock;
use tankpump::app::commands::AppCommand;
use tankpump::app::events::{AppEvent, Mode};
use tankpump::app::ports::{ConfigPort, StoragePort};
use tankpump::app::service::AppService;
use tankpump::config::{PumpConfig, SettingsPatch};
use tankpump::control::pump::PumpReason;
use tankpump::relay::codec::decode_command;
use tankpump::schedule::WallTime;

struct Rig {
    app: AppService,
    hw: MockHardware,
    clock: SimClock,
    store: ConfigStore<NvsStorage>,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(PumpConfig::default())
    }

    fn with_config(config: PumpConfig) -> Self {
        let mut app = AppService::new(config);
        let mut hw = MockHardware::new();
        let mut sink = RecordingSink::new();
        app.start(&mut hw, &mut sink);
        hw.clear();
        sink.events.clear();
        Self {
            app,
            hw,
            clock: SimClock::new(None),
            store: ConfigStore::new(NvsStorage::new().unwrap()),
            sink,
        }
    }

    fn at(&self, day: u16, hour: u8, minute: u8) {
        self.clock.set(Some(WallTime::new(day, hour, minute)));
    }

    fn tick(&mut self, fill: f32) {
        self.hw.set_fill(fill);
        self.app.tick(&mut self.hw, &self.clock, &mut self.sink);
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app
            .handle_command(cmd, &mut self.hw, &mut self.store, &mut self.sink);
    }

    fn pump_event(&self, on: bool, reason: PumpReason) -> bool {
        self.sink.any(|e| {
            matches!(e, AppEvent::PumpChanged { on: o, reason: r } if *o == on && *r == reason)
        })
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_drives_relay_off_and_announces() {
    let mut app = AppService::new(PumpConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);

    assert_eq!(hw.relay_writes(), vec![false]);
    assert!(sink.any(|e| matches!(e, AppEvent::Started { pump_on: false })));
    assert_eq!(app.mode(), Mode::Auto);
}

// ── Level thresholds ──────────────────────────────────────────

#[test]
fn low_level_starts_pump_without_clock() {
    let mut rig = Rig::new();
    rig.tick(15.0);

    assert!(rig.app.pump_on());
    assert_eq!(rig.hw.relay_writes(), vec![true]);
    assert_eq!(rig.hw.beeps(), vec![(1, 500)]);
    assert!(rig.pump_event(true, PumpReason::LowLevel));
}

#[test]
fn full_tank_stops_pump() {
    let mut rig = Rig::new();
    rig.at(1, 10, 0);
    rig.tick(15.0);
    rig.tick(50.0);
    assert!(rig.app.pump_on(), "mid-level keeps running");

    rig.tick(92.0);
    assert!(!rig.app.pump_on());
    assert_eq!(rig.hw.relay_writes(), vec![true, false]);
    assert_eq!(rig.hw.beeps(), vec![(1, 500), (2, 200)]);
    assert!(rig.pump_event(false, PumpReason::Full));
}

#[test]
fn mid_level_without_clock_leaves_pump_alone() {
    let mut rig = Rig::new();
    rig.tick(80.0);
    assert!(!rig.app.pump_on());
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn failed_distance_read_holds_last_fill() {
    let mut rig = Rig::new();
    rig.tick(40.0);
    rig.hw.distance_cm = None;
    let status = rig.app.tick(&mut rig.hw, &rig.clock, &mut rig.sink);
    assert_eq!(status.level, 40);
    assert!(!rig.app.pump_on());
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn manual_on_holds_until_auto() {
    let mut rig = Rig::new();
    rig.at(1, 10, 0);

    rig.command(AppCommand::PumpOn);
    assert!(rig.app.is_manual());
    assert_eq!(rig.hw.relay_writes(), vec![true]);
    assert_eq!(rig.hw.beeps(), vec![(1, 100)]);
    assert!(rig.sink.any(|e| matches!(e, AppEvent::ModeChanged(Mode::Manual))));

    // A full tank would normally stop the pump.
    rig.tick(95.0);
    assert!(rig.app.pump_on());
    assert_eq!(rig.hw.relay_writes(), vec![true]);

    rig.command(AppCommand::Auto);
    assert!(!rig.app.is_manual());
    assert_eq!(rig.hw.beeps().last(), Some(&(2, 50)));
    assert!(rig.sink.any(|e| matches!(e, AppEvent::ModeChanged(Mode::Auto))));

    rig.tick(95.0);
    assert!(!rig.app.pump_on());
    assert!(rig.pump_event(false, PumpReason::Full));
}

#[test]
fn manual_off_suppresses_low_level_start() {
    let mut rig = Rig::new();
    rig.command(AppCommand::PumpOff);
    rig.tick(5.0);
    assert!(!rig.app.pump_on());
    assert_eq!(rig.hw.relay_writes(), vec![false]);
}

#[test]
fn repeated_manual_command_emits_one_mode_change() {
    let mut rig = Rig::new();
    rig.command(AppCommand::PumpOn);
    rig.command(AppCommand::PumpOff);
    let changes = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ModeChanged(_)))
        .count();
    assert_eq!(changes, 1);
    assert_eq!(rig.hw.relay_writes(), vec![true, false]);
}

// ── Fill windows ──────────────────────────────────────────────

#[test]
fn window_starts_pump_once() {
    let mut rig = Rig::new();
    rig.at(1, 8, 5);
    rig.tick(80.0);

    assert!(rig.app.pump_on());
    assert!(rig.pump_event(true, PumpReason::Scheduled));
    assert_eq!(rig.app.controller().last_schedule_hour(), Some(8));

    rig.tick(89.0);
    rig.at(1, 8, 6);
    rig.tick(91.0);
    assert!(!rig.app.pump_on());
    assert_eq!(rig.hw.relay_writes(), vec![true, false]);
    assert!(!rig.app.recovery_pending());
}

#[test]
fn window_skipped_when_nearly_full() {
    let mut rig = Rig::new();
    rig.at(1, 8, 0);
    rig.tick(88.0);
    assert!(!rig.app.pump_on());
    assert_eq!(rig.app.controller().last_schedule_hour(), Some(8));

    // An hour later the slot counts as resolved, not missed.
    rig.at(1, 9, 0);
    rig.tick(60.0);
    assert!(!rig.app.recovery_pending());
    assert!(!rig.app.pump_on());
}

#[test]
fn window_after_its_ten_minutes_is_missed() {
    let mut rig = Rig::new();
    rig.at(1, 8, 10);
    rig.tick(80.0);
    assert!(!rig.app.pump_on());
    assert_eq!(rig.app.controller().last_schedule_hour(), None);
}

#[test]
fn schedules_disabled_ignores_windows() {
    let mut rig = Rig::with_config(PumpConfig {
        schedules_enabled: false,
        ..PumpConfig::default()
    });
    rig.at(1, 8, 0);
    rig.tick(60.0);
    rig.at(1, 9, 0);
    rig.tick(60.0);
    assert!(!rig.app.pump_on());
    assert!(!rig.app.recovery_pending());
}

// ── Recovery ──────────────────────────────────────────────────

#[test]
fn missed_window_recovers_and_clears_when_full() {
    let mut rig = Rig::new();
    rig.at(1, 9, 0);
    rig.tick(60.0);

    assert!(rig.app.pump_on());
    assert!(rig.app.recovery_pending());
    assert!(rig.pump_event(true, PumpReason::Recovery));
    assert_eq!(rig.hw.beeps(), vec![(3, 200)]);

    rig.at(1, 9, 30);
    rig.tick(95.0);
    assert!(!rig.app.pump_on());
    assert!(!rig.app.recovery_pending());
}

#[test]
fn recovery_waits_for_trigger_level() {
    let mut rig = Rig::new();
    rig.at(1, 9, 0);
    rig.tick(75.0);
    assert!(rig.app.recovery_pending());
    assert!(!rig.app.pump_on());

    rig.tick(70.0);
    assert!(rig.app.pump_on());
    assert!(rig.pump_event(true, PumpReason::Recovery));
}

// ── Pre-window throttle ───────────────────────────────────────

#[test]
fn pre_window_hour_stops_at_limit() {
    let mut rig = Rig::new();
    rig.at(1, 7, 30);
    rig.tick(15.0);
    assert!(rig.app.pump_on());

    rig.at(1, 7, 40);
    rig.tick(66.0);
    assert!(!rig.app.pump_on());
    assert!(rig.pump_event(false, PumpReason::PreScheduleLimit));

    // Outside the pre-window hour the normal ceiling applies again.
    rig.at(1, 10, 0);
    rig.command(AppCommand::PumpOn);
    rig.command(AppCommand::Auto);
    rig.tick(66.0);
    assert!(rig.app.pump_on());
}

#[test]
fn start_and_stop_in_one_tick_leave_relay_untouched() {
    let mut rig = Rig::with_config(PumpConfig {
        pre_schedule_limit: 10,
        ..PumpConfig::default()
    });
    rig.at(1, 7, 0);
    rig.tick(15.0);

    assert!(!rig.app.pump_on());
    assert!(rig.hw.relay_writes().is_empty());
    assert_eq!(rig.hw.beeps(), vec![(1, 500), (2, 200)]);
}

// ── Day rollover ──────────────────────────────────────────────

#[test]
fn new_day_rearms_windows() {
    let mut rig = Rig::new();
    rig.at(1, 20, 5);
    rig.tick(92.0);
    assert_eq!(rig.app.controller().last_schedule_hour(), Some(20));

    rig.at(2, 0, 30);
    rig.tick(80.0);
    assert_eq!(rig.app.controller().last_schedule_hour(), None);

    rig.at(2, 8, 0);
    rig.tick(80.0);
    assert!(rig.app.pump_on());
    assert!(rig.pump_event(true, PumpReason::Scheduled));
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn settings_frame_updates_and_persists() {
    let mut rig = Rig::new();
    let cmd = decode_command(br#"{"command":"SETTINGS","min":25}"#).unwrap();
    rig.command(cmd);

    let expected = PumpConfig {
        pump_on_level: 25,
        ..PumpConfig::default()
    };
    assert_eq!(*rig.app.config(), expected);
    assert_eq!(rig.store.load().unwrap(), expected);
    assert_eq!(rig.hw.beeps(), vec![(3, 100)]);
    assert!(rig.sink.any(|e| matches!(e, AppEvent::SettingsSaved(c) if *c == expected)));

    // New threshold takes effect on the next tick.
    rig.tick(24.0);
    assert!(rig.app.pump_on());
}

#[test]
fn invalid_settings_are_rejected_untouched() {
    let mut rig = Rig::new();
    rig.command(AppCommand::Settings(SettingsPatch {
        pump_on_level: Some(95),
        ..SettingsPatch::default()
    }));

    assert_eq!(*rig.app.config(), PumpConfig::default());
    assert!(rig.hw.beeps().is_empty());
    assert!(rig.sink.any(|e| matches!(e, AppEvent::SettingsRejected(_))));
    assert!(!rig.store.storage().exists("tankcfg", "on"));
}

#[test]
fn settings_stay_live_when_save_fails() {
    let mut rig = Rig::new();
    rig.store.storage().sim_fail_io(true);
    rig.command(AppCommand::Settings(SettingsPatch {
        pump_off_level: Some(80),
        ..SettingsPatch::default()
    }));

    assert_eq!(rig.app.config().pump_off_level, 80);
    assert!(rig.hw.beeps().is_empty());
    assert!(rig.sink.any(|e| matches!(e, AppEvent::ConfigSaveFailed)));
    assert!(!rig.sink.any(|e| matches!(e, AppEvent::SettingsSaved(_))));

    // Storage comes back: the next change is stored and confirmed.
    rig.store.storage().sim_fail_io(false);
    rig.command(AppCommand::Settings(SettingsPatch {
        pump_off_level: Some(85),
        ..SettingsPatch::default()
    }));
    assert_eq!(rig.hw.beeps(), vec![(3, 100)]);
    assert_eq!(rig.store.load().unwrap().pump_off_level, 85);
}

#[test]
fn settings_do_not_change_mode_or_pump() {
    let mut rig = Rig::new();
    rig.command(AppCommand::PumpOn);
    rig.hw.clear();
    rig.command(AppCommand::Settings(SettingsPatch {
        schedules_enabled: Some(false),
        ..SettingsPatch::default()
    }));
    assert!(rig.app.is_manual());
    assert!(rig.app.pump_on());
    assert!(rig.hw.relay_writes().is_empty());
}

// ── Status snapshot ───────────────────────────────────────────

#[test]
fn status_reflects_state() {
    let mut rig = Rig::new();
    rig.hw.temperature_c = Some(22.5);
    rig.command(AppCommand::PumpOn);
    rig.tick(47.4);

    let s = rig.app.status();
    assert_eq!(s.level, 47);
    assert!(s.pump);
    assert_eq!(s.temp, 22.5);
    assert_eq!(s.mode, Mode::Manual);
    assert_eq!(s.settings.min, 20);
    assert_eq!(s.settings.h_cm, 100);
    assert_eq!(rig.app.tick_count(), 1);
}
