//! Somnolog - BLE wearable sensor streamer for sleep-quality research.
//!
//! This library streams accelerometer, gyroscope, and thermometer samples
//! from a wearable sensor and appends them to a flat per-session file for
//! later sleep-quality analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Somnolog                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────┐       │
//! │  │   Driver    │──▶│ SensorBridge │──▶│ StreamWriter│──▶ disk
//! │  │ (vendor SDK)│   │  (callbacks) │   │  (buffered) │       │
//! │  └─────────────┘   └──────────────┘   └─────────────┘       │
//! │         │                  │                  │             │
//! │         ▼                  ▼                  ▼             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Disconnect  │    │   Session   │    │   Session   │      │
//! │  │   signal    │    │    stats    │    │  registry   │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: driver callbacks enqueue samples on a bounded
//! channel, the session pump drains them into the writer, and the writer
//! appends rows to the session file with small bounded batches. Nothing
//! reads the file back during a session.
//!
//! # Example
//!
//! ```no_run
//! use somnolog::{ChannelConfig, FlushPolicy, SensorBridge, SimulatedDriver, StreamWriter};
//!
//! let mut bridge = SensorBridge::new(SimulatedDriver::new("C4:7C:8D:6A:00:01"));
//! let mut writer =
//!     StreamWriter::create("night1.csv", FlushPolicy::default()).expect("create session file");
//!
//! bridge.start(&ChannelConfig::default()).expect("start streaming");
//!
//! // Samples can be drained from bridge.samples(), or handed to
//! // somnolog::run_session for a full pump loop.
//! ```

pub mod bridge;
pub mod config;
pub mod metadata;
pub mod session;
pub mod stats;
pub mod writer;

// Re-export key types at crate root for convenience
pub use bridge::{
    BridgeError, Channel, Driver, DriverError, Sample, SampleValues, SensorBridge,
    SimulatedDriver,
};
pub use config::{ChannelConfig, Config};
pub use metadata::{MetadataStore, SessionRecord};
pub use session::{run_session, SessionError, SessionSummary};
pub use stats::{SessionStats, SharedSessionStats, StatsSnapshot};
pub use writer::{FlushPolicy, StreamWriter, WriteError, ROW_HEADER};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
