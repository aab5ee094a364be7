//! GPIO / peripheral pin assignments for the TankPump controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Digital output driving the pump relay module.
pub const PUMP_RELAY_GPIO: i32 = 26;
/// Most opto-isolated relay boards energise the coil on LOW.
pub const PUMP_RELAY_ACTIVE_LOW: bool = true;

/// Piezo buzzer / indicator LED (driven together through one transistor).
pub const BUZZER_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// JSN-SR04T ultrasonic trigger (output).
pub const ULTRASONIC_TRIG_GPIO: i32 = 5;
/// JSN-SR04T ultrasonic echo (input, 5 V tolerant through divider).
pub const ULTRASONIC_ECHO_GPIO: i32 = 18;

/// NTC thermistor on ADC1 channel 6 (GPIO 34 on ESP32).
pub const TEMP_ADC_GPIO: i32 = 34;
pub const TEMP_ADC_CHANNEL: u32 = 6;
