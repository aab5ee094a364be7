//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, relay, buzzer, clock, event sinks, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the pump policy never touches hardware
//! directly.

use crate::config::PumpConfig;
use crate::schedule::WallTime;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick.
///
/// `None` means the reading is invalid this tick; the domain holds the
/// last good value.
pub trait SensorPort {
    /// Distance from the sensor face to the water surface (cm).
    fn read_distance_cm(&mut self) -> Option<f32>;

    /// Water temperature (°C).
    fn read_temperature_c(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Actuator / feedback ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Binary pump relay.
pub trait ActuatorPort {
    fn set_pump(&mut self, on: bool);
}

/// Audible / visual indicator with a "beep N times, D ms each" contract.
pub trait FeedbackPort {
    fn beep(&mut self, times: u8, duration_ms: u16);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.
pub trait ClockPort {
    /// Current local time, or `None` if the clock is not synced.
    fn now(&self) -> Option<WallTime>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the pump configuration.
///
/// Implementations MUST validate before persisting and MUST finish the
/// write before `save` returns.
pub trait ConfigPort {
    /// Load configuration; missing keys take their defaults.
    fn load(&self) -> Result<PumpConfig, ConfigError>;

    /// Validate and persist every field.
    fn save(&mut self, config: &PumpConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage with atomic single-key writes.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    /// A stored value longer than `buf` is `BufferTooSmall`, never truncated.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// The stored value does not fit the caller's buffer.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "value larger than buffer"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("storage I/O"),
        }
    }
}
