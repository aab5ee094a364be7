//! Boot-time config loading through `ConfigStore` over host NVS.

use tankpump::adapters::config_store::ConfigStore;
use tankpump::adapters::nvs::NvsStorage;
use tankpump::app::commands::AppCommand;
use tankpump::app::ports::{ConfigPort, StoragePort};
use tankpump::app::service::AppService;
use tankpump::config::{PumpConfig, SettingsPatch};

use super::mock_hw::{MockHardware, RecordingSink};

fn store() -> ConfigStore<NvsStorage> {
    ConfigStore::new(NvsStorage::new().unwrap())
}

#[test]
fn first_boot_uses_defaults() {
    let store = store();
    assert_eq!(store.load().unwrap(), PumpConfig::default());
}

#[test]
fn settings_survive_restart() {
    let mut store = store();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    let mut app = AppService::new(store.load().unwrap());
    app.handle_command(
        AppCommand::Settings(SettingsPatch {
            pump_off_level: Some(85),
            schedules_enabled: Some(false),
            tank_height_cm: Some(150),
            ..SettingsPatch::default()
        }),
        &mut hw,
        &mut store,
        &mut sink,
    );
    drop(app);

    let rebooted = AppService::new(store.load().unwrap());
    assert_eq!(rebooted.config().pump_off_level, 85);
    assert!(!rebooted.config().schedules_enabled);
    assert_eq!(rebooted.config().tank_height_cm, 150);
    assert_eq!(rebooted.config().pump_on_level, 20);
}

#[test]
fn corrupt_entry_falls_back_per_field() {
    let mut store = store();
    store
        .storage_mut()
        .write("tankcfg", "off", &[80])
        .unwrap();
    store
        .storage_mut()
        .write("tankcfg", "h_cm", &[1, 2, 3])
        .unwrap();

    let cfg = store.load().unwrap();
    assert_eq!(cfg.pump_off_level, 80);
    assert_eq!(cfg.tank_height_cm, 100);
}

#[test]
fn inconsistent_stored_set_loads_defaults() {
    let mut store = store();
    // on >= off breaks the threshold ordering.
    store.storage_mut().write("tankcfg", "on", &[90]).unwrap();
    store.storage_mut().write("tankcfg", "off", &[40]).unwrap();

    assert_eq!(store.load().unwrap(), PumpConfig::default());
}
