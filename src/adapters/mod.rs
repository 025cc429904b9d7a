//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                |
//! |-------------|----------------|----------------------------|
//! | `hardware`  | SensorPort     | DHT sensors, ESP32 ADC1    |
//! |             | ActuatorPort   | Pump GPIOs, status LED     |
//! | `log_sink`  | EventSink      | Serial log output          |
//! | `mqtt`      | BrokerPort     | ESP-IDF MQTT client        |
//! | `time`      | ClockPort      | ESP32 system timer         |
//! | `wifi`      | LinkPort       | ESP-IDF WiFi STA           |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
