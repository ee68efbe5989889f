//! Sensor bridge module.
//!
//! Adapts the external driver's asynchronous notification mechanism into a
//! stream of timestamped samples for the writer side. The vendor BLE
//! transport plugs in through the [`Driver`] trait; a signal-generator
//! implementation is bundled for hardware-free runs.

pub mod driver;
pub mod sensor;
pub mod simulated;
pub mod types;

// Re-export commonly used types
pub use driver::{DisconnectCallback, Driver, DriverError, SampleCallback};
pub use sensor::{BridgeError, SensorBridge};
pub use simulated::{SimulatedDriver, MAX_AGGREGATE_RATE_HZ};
pub use types::{Channel, Sample, SampleValues};
