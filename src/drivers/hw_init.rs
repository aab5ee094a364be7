//! One-shot hardware peripheral initialization and raw sensor I/O.
//!
//! Configures the ADC1 oneshot unit and the ultrasonic trigger/echo GPIOs
//! using raw ESP-IDF sys calls.  Called once from `main()` before the
//! control loop starts.  The relay and buzzer pins are owned by
//! `esp_idf_hal` pin drivers and are not touched here.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_ultrasonic()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the init path or the main-loop read
/// path.  `init_adc()` completes before the control loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret =
        unsafe { adc_oneshot_config_channel(adc1_handle(), pins::TEMP_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!(
        "hw_init: ADC1 configured (CH{}=temp)",
        pins::TEMP_ADC_CHANNEL
    );
    Ok(())
}

/// Raw 12-bit conversion, or `None` if the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    None
}

// ── Ultrasonic trigger / echo ─────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ultrasonic() -> Result<(), HwInitError> {
    let trig = gpio_config_t {
        pin_bit_mask: 1u64 << pins::ULTRASONIC_TRIG_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&trig) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(pins::ULTRASONIC_TRIG_GPIO, 0) };

    let echo = gpio_config_t {
        pin_bit_mask: 1u64 << pins::ULTRASONIC_ECHO_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&echo) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!(
        "hw_init: ultrasonic configured (trig={}, echo={})",
        pins::ULTRASONIC_TRIG_GPIO,
        pins::ULTRASONIC_ECHO_GPIO
    );
    Ok(())
}

/// Fire one ping and return the echo pulse width in microseconds.
///
/// Returns `u32::MAX` when the echo does not rise or fall within
/// `timeout_us`.  Worst case blocks for `2 * timeout_us`.
#[cfg(target_os = "espidf")]
pub fn ultrasonic_ping_us(timeout_us: u32) -> u32 {
    let timeout = i64::from(timeout_us);
    // SAFETY: trigger/echo pins were configured in init_ultrasonic();
    // gpio level access and esp_timer reads are register operations.
    unsafe {
        gpio_set_level(pins::ULTRASONIC_TRIG_GPIO, 0);
        esp_rom_delay_us(2);
        gpio_set_level(pins::ULTRASONIC_TRIG_GPIO, 1);
        esp_rom_delay_us(10);
        gpio_set_level(pins::ULTRASONIC_TRIG_GPIO, 0);

        let armed = esp_timer_get_time();
        while gpio_get_level(pins::ULTRASONIC_ECHO_GPIO) == 0 {
            if esp_timer_get_time() - armed > timeout {
                return u32::MAX;
            }
        }
        let rise = esp_timer_get_time();
        while gpio_get_level(pins::ULTRASONIC_ECHO_GPIO) != 0 {
            if esp_timer_get_time() - rise > timeout {
                return u32::MAX;
            }
        }
        (esp_timer_get_time() - rise) as u32
    }
}
