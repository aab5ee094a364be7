//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to               |
//! |-----------------|--------------------|---------------------------|
//! | `config_store`  | ConfigPort         | per-key entries in NVS    |
//! | `hardware`      | SensorPort         | ultrasonic, NTC via ADC   |
//! |                 | ActuatorPort       | pump relay GPIO           |
//! |                 | FeedbackPort       | buzzer GPIO               |
//! | `log_sink`      | EventSink          | Serial log output         |
//! | `nvs`           | StoragePort        | NVS / in-memory store     |
//! | `tcp_transport` | Transport          | relay server over TCP     |
//! | `time`          | ClockPort          | SNTP-synced system clock  |

pub mod config_store;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod tcp_transport;
pub mod time;
