//! Bridge between the driver's notification callbacks and the writer side.
//!
//! The bridge adapts the driver's asynchronous, long-lived notification
//! mechanism into a stream of [`Sample`] values on a bounded channel. Driver
//! callbacks only enqueue; they never touch disk, so the driver thread is
//! never blocked on I/O.

use crate::bridge::driver::{Driver, DriverError};
use crate::bridge::types::{Channel, Sample};
use crate::config::ChannelConfig;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Bound on queued samples between the driver callbacks and the consumer.
///
/// When the queue is full, new samples are dropped and counted rather than
/// blocking the driver thread or growing without bound.
const SAMPLE_QUEUE_BOUND: usize = 10_000;

/// Adapts driver notifications into a consumable sample stream.
pub struct SensorBridge<D: Driver> {
    driver: D,
    sender: Sender<Sample>,
    receiver: Receiver<Sample>,
    streaming: bool,
    active: Vec<Channel>,
    dropped: Arc<AtomicU64>,
    disconnected: Arc<AtomicBool>,
}

impl<D: Driver> SensorBridge<D> {
    /// Create a bridge over `driver`.
    pub fn new(driver: D) -> Self {
        let (sender, receiver) = bounded(SAMPLE_QUEUE_BOUND);
        Self {
            driver,
            sender,
            receiver,
            streaming: false,
            active: Vec::new(),
            dropped: Arc::new(AtomicU64::new(0)),
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connect the driver and subscribe every enabled channel.
    ///
    /// The driver holds each channel callback from here until [`stop`];
    /// callbacks enqueue samples and never perform I/O. On any subscription
    /// failure the channels registered so far are rolled back.
    ///
    /// [`stop`]: SensorBridge::stop
    pub fn start(&mut self, channels: &ChannelConfig) -> Result<(), BridgeError> {
        if self.streaming {
            return Err(BridgeError::AlreadyStreaming);
        }
        let enabled = channels.enabled();
        if enabled.is_empty() {
            return Err(BridgeError::NoChannels);
        }

        self.disconnected.store(false, Ordering::SeqCst);
        self.driver.connect()?;

        let disconnected = self.disconnected.clone();
        self.driver.on_disconnect(Box::new(move || {
            disconnected.store(true, Ordering::SeqCst);
        }));

        for (channel, rate_hz) in enabled {
            let sender = self.sender.clone();
            let dropped = self.dropped.clone();
            let result = self.driver.subscribe(
                channel,
                rate_hz,
                Box::new(move |sample| {
                    if sender.try_send(sample).is_err() {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }),
            );

            if let Err(e) = result {
                for registered in self.active.drain(..) {
                    self.driver.unsubscribe(registered);
                }
                self.driver.disconnect();
                return Err(e.into());
            }
            self.active.push(channel);
        }

        self.streaming = true;
        Ok(())
    }

    /// Deregister all channel callbacks and disconnect the driver.
    ///
    /// Idempotent; a second call is a no-op. The session pump pairs this
    /// with closing the stream writer.
    pub fn stop(&mut self) {
        if !self.streaming {
            return;
        }
        for channel in self.active.drain(..) {
            self.driver.unsubscribe(channel);
        }
        self.driver.disconnect();
        self.streaming = false;
    }

    /// Whether the bridge currently holds active subscriptions.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Whether the device dropped the link mid-session.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Consuming side of the sample queue.
    pub fn samples(&self) -> &Receiver<Sample> {
        &self.receiver
    }

    /// Samples dropped because the queue was full.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<D: Driver> Drop for SensorBridge<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Errors surfaced when starting a streaming session.
#[derive(Debug)]
pub enum BridgeError {
    /// `start` was called while a session is active
    AlreadyStreaming,
    /// The channel configuration enables nothing
    NoChannels,
    /// The device is unreachable
    Connection(String),
    /// The requested channel/rate combination exceeds hardware capability
    UnsupportedRate { channel: Channel, rate_hz: f32 },
}

impl From<DriverError> for BridgeError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::UnsupportedRate { channel, rate_hz } => {
                BridgeError::UnsupportedRate { channel, rate_hz }
            }
            other => BridgeError::Connection(other.to_string()),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::AlreadyStreaming => write!(f, "bridge is already streaming"),
            BridgeError::NoChannels => write!(f, "no channels enabled"),
            BridgeError::Connection(msg) => write!(f, "could not reach device: {msg}"),
            BridgeError::UnsupportedRate { channel, rate_hz } => {
                write!(f, "unsupported rate {rate_hz} Hz for channel {channel}")
            }
        }
    }
}

impl std::error::Error for BridgeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::simulated::SimulatedDriver;

    fn accel_only() -> ChannelConfig {
        let mut channels = ChannelConfig::from_csv("accel");
        channels.accel_rate_hz = 25.0;
        channels
    }

    #[test]
    fn test_start_requires_channels() {
        let mut bridge = SensorBridge::new(SimulatedDriver::new("C4:7C:8D:6A:00:01"));
        let none = ChannelConfig::from_csv("");
        assert!(matches!(bridge.start(&none), Err(BridgeError::NoChannels)));
    }

    #[test]
    fn test_start_twice_fails() {
        let mut bridge = SensorBridge::new(SimulatedDriver::new("C4:7C:8D:6A:00:01"));
        bridge.start(&accel_only()).unwrap();
        assert!(matches!(
            bridge.start(&accel_only()),
            Err(BridgeError::AlreadyStreaming)
        ));
        bridge.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut bridge = SensorBridge::new(SimulatedDriver::new("C4:7C:8D:6A:00:01"));
        bridge.start(&accel_only()).unwrap();
        bridge.stop();
        assert!(!bridge.is_streaming());
        bridge.stop();
        assert!(!bridge.is_streaming());
    }

    #[test]
    fn test_unreachable_device_surfaces_connection_error() {
        let mut bridge = SensorBridge::new(SimulatedDriver::new(""));
        assert!(matches!(
            bridge.start(&accel_only()),
            Err(BridgeError::Connection(_))
        ));
    }

    #[test]
    fn test_unsupported_rate_surfaces_before_streaming() {
        let mut bridge = SensorBridge::new(SimulatedDriver::new("C4:7C:8D:6A:00:01"));
        let mut channels = ChannelConfig::from_csv("accel,gyro");
        channels.accel_rate_hz = 80.0;
        channels.gyro_rate_hz = 80.0;
        assert!(matches!(
            bridge.start(&channels),
            Err(BridgeError::UnsupportedRate { .. })
        ));
        assert!(!bridge.is_streaming());
    }
}
