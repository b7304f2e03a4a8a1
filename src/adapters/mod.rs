//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements          | Connects to                 |
//! |----------------|---------------------|-----------------------------|
//! | `queues`       | LedSink, TicketSink | static inter-task queues    |
//! |                | KeySource           |                             |
//! | `station`      | StationPorts        | queues + SIP + AP bundle    |
//! | `log_sink`     | EventSink           | Serial log output           |
//! | `time`         | Clock               | ESP32 system timer          |
//! | `i2c_bus`      | BusPort             | ESP-IDF I²C master          |
//! | `wifi_ap`      | AccessPointPort     | ESP-IDF WiFi in AP mode     |
//! | `sip`          | SipPort             | ESP-ADF SIP stack / sim     |
//! | `config_store` | ConfigPort          | JSON file on SPIFFS         |
//! | `reporter`     | (own task)          | HTTP form POST to the ward  |

pub mod config_store;
#[cfg(target_os = "espidf")]
pub mod i2c_bus;
pub mod log_sink;
pub mod queues;
pub mod reporter;
pub mod sip;
pub mod station;
pub mod time;
pub(super) mod utils;
pub mod wifi_ap;
