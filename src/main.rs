//! TankPump firmware entry point.
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   ConfigStore   Esp32Time    │
//! │  (Sensor+Actuator+   (EventSink)    (ConfigPort)  (ClockPort)  │
//! │   Feedback)          RelayLink<TcpTransport>                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            AppService → PumpController                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Loop cadence: a 20 ms sub-tick drives the buzzer and polls the relay
//! link; every `sample_interval_ms` the mailbox is drained and one
//! sampling tick runs.
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_hal::modem::Modem;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration as WifiCfg, EspWifi};
use log::{error, info, warn};

use tankpump::adapters::config_store::ConfigStore;
use tankpump::adapters::hardware::HardwareAdapter;
use tankpump::adapters::log_sink::LogEventSink;
use tankpump::adapters::nvs::NvsStorage;
use tankpump::adapters::tcp_transport::{DEFAULT_PORT, TcpTransport};
use tankpump::adapters::time::Esp32TimeAdapter;
use tankpump::app::events::AppEvent;
use tankpump::app::ports::{ConfigPort, EventSink};
use tankpump::app::service::AppService;
use tankpump::config::{PumpConfig, TimingConfig};
use tankpump::drivers::buzzer::Buzzer;
use tankpump::drivers::hw_init;
use tankpump::drivers::relay::RelayDriver;
use tankpump::pins;
use tankpump::relay::link::RelayLink;
use tankpump::relay::mailbox::MAILBOX;
use tankpump::sensors::SensorHub;
use tankpump::sensors::distance::DistanceSensor;
use tankpump::sensors::temperature::TemperatureSensor;

/// Buzzer / relay-link polling period.
const SUB_TICK_MS: u32 = 20;
/// How often a dropped WiFi association is retried.
const WIFI_RETRY_MS: u64 = 30_000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TankPump v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;
    let peripherals = Peripherals::take()?;

    // SAFETY: pin numbers come from `pins`, and nothing else in the
    // firmware claims the relay or buzzer GPIO.
    let relay_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::PUMP_RELAY_GPIO) })?;
    let buzzer_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::BUZZER_GPIO) })?;

    let mut hw = HardwareAdapter::new(
        SensorHub::new(
            DistanceSensor::new(pins::ULTRASONIC_TRIG_GPIO, pins::ULTRASONIC_ECHO_GPIO),
            TemperatureSensor::new(pins::TEMP_ADC_GPIO),
        ),
        RelayDriver::new(relay_pin, pins::PUMP_RELAY_ACTIVE_LOW),
        Buzzer::new(buzzer_pin),
    );

    // ── 3. Load config (defaults on any failure) ──────────────
    let storage = NvsStorage::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;
    let mut store = ConfigStore::new(storage);
    let config = store.load().unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        PumpConfig::default()
    });

    // ── 4. Network: WiFi + SNTP (optional) ────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let mut wifi = match connect_wifi(peripherals.modem, sysloop) {
        Ok(w) => w,
        Err(e) => {
            warn!("WiFi unavailable ({}), running offline", e);
            None
        }
    };
    let _sntp = if wifi.is_some() {
        set_timezone();
        match EspSntp::new_default() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("SNTP start failed ({}), schedules stay idle", e);
                None
            }
        }
    } else {
        None
    };

    let mut link = RelayLink::new(
        TcpTransport::new(DEFAULT_PORT).map_err(|e| anyhow!("relay listener: {}", e))?,
    );

    // ── 5. App service ────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let timing = TimingConfig::default();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config);
    app.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    let mut last_sub = clock.uptime_ms();
    let mut last_sample = last_sub;
    let mut last_wifi_check = last_sub;

    loop {
        let now = clock.uptime_ms();
        hw.tick_feedback(now.saturating_sub(last_sub) as u32);
        last_sub = now;

        link.transport_mut().accept();
        if link.transport().is_connected() {
            link.poll(&MAILBOX);
        }

        if now.saturating_sub(last_sample) >= u64::from(timing.sample_interval_ms) {
            last_sample = now;

            for cmd in MAILBOX.drain() {
                app.handle_command(cmd, &mut hw, &mut store, &mut sink);
            }

            let status = app.tick(&mut hw, &clock, &mut sink);
            hw.resync_relay();
            if app.tick_count() % u64::from(timing.telemetry_every_ticks.max(1)) == 0 {
                sink.emit(&AppEvent::Telemetry(status.clone()));
            }
            if link.transport().is_connected() {
                if let Err(e) = link.send_status(&status) {
                    warn!("status encode failed: {}", e);
                }
            }
        }

        if now.saturating_sub(last_wifi_check) >= WIFI_RETRY_MS {
            last_wifi_check = now;
            if let Some(w) = wifi.as_mut() {
                if !w.is_connected().unwrap_or(false) {
                    warn!("WiFi down, reconnecting");
                    if let Err(e) = w.wifi_mut().connect() {
                        error!("WiFi reconnect failed: {}", e);
                    }
                }
            }
        }

        FreeRtos::delay_ms(SUB_TICK_MS);
    }
}

// ── Network bring-up ──────────────────────────────────────────

/// Join the access point named at build time.  Returns `Ok(None)` when
/// the firmware was built without credentials.
fn connect_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
) -> Result<Option<BlockingWifi<EspWifi<'static>>>> {
    let Some(ssid) = option_env!("TANKPUMP_WIFI_SSID") else {
        info!("WiFi: no TANKPUMP_WIFI_SSID at build time, staying offline");
        return Ok(None);
    };
    let password = option_env!("TANKPUMP_WIFI_PASS").unwrap_or("");

    let esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;
    let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
    wifi.set_configuration(&WifiCfg::Client(ClientConfiguration {
        ssid: ssid.try_into().map_err(|()| anyhow!("SSID too long"))?,
        password: password
            .try_into()
            .map_err(|()| anyhow!("WiFi password too long"))?,
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;

    let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
    info!("WiFi connected. IP: {}", ip_info.ip);
    Ok(Some(wifi))
}

/// Apply the POSIX TZ string given at build time (UTC otherwise), so
/// the schedule runs on local wall time.
fn set_timezone() {
    let tz = option_env!("TANKPUMP_TZ").unwrap_or("UTC0");
    // SAFETY: called once from the main task before any other thread
    // reads the environment.
    unsafe {
        std::env::set_var("TZ", tz);
        esp_idf_svc::sys::tzset();
    }
    info!("Timezone: {}", tz);
}
