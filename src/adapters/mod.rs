//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                  |
//! |------------|----------------|------------------------------|
//! | `console`  | (AppCommand)   | UART console, line commands  |
//! | `hardware` | SwitchPort     | Switch GPIO (embedded-hal)   |
//! |            | RelayActuator  | Relay GPIO (embedded-hal)    |
//! | `log_sink` | EventSink      | Serial log output            |
//! | `nvs`      | ConfigPort     | NVS / in-memory store        |
//! | `time`     | ClockPort      | ESP32 timer + system clock   |

pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
