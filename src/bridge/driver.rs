//! Contract with the external sensor driver.
//!
//! The vendor SDK that speaks BLE to the physical wearable sits behind this
//! trait; the crate never reimplements the radio protocol. All it relies on
//! is that the driver delivers timestamped samples through registered
//! callbacks, at up to ~100 Hz aggregate.

use crate::bridge::types::{Channel, Sample};

/// Callback invoked by the driver for every delivered sample.
///
/// The driver may invoke callbacks from its own threads. A registered
/// callback must be kept alive by the driver until the matching
/// [`Driver::unsubscribe`]; releasing it earlier leaves a dangling
/// notification handler inside the vendor SDK.
pub type SampleCallback = Box<dyn Fn(Sample) + Send + Sync + 'static>;

/// Callback invoked if the device drops the link mid-session.
pub type DisconnectCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// External sensor driver surface consumed by the bridge.
pub trait Driver {
    /// Connect to the device.
    fn connect(&mut self) -> Result<(), DriverError>;

    /// Register `callback` for `channel` notifications at `rate_hz`.
    ///
    /// Hardware may clamp the rate to what it supports; a combination of
    /// channels and rates beyond capability fails with
    /// [`DriverError::UnsupportedRate`]. The driver owns the callback from
    /// this call until [`Driver::unsubscribe`].
    fn subscribe(
        &mut self,
        channel: Channel,
        rate_hz: f32,
        callback: SampleCallback,
    ) -> Result<(), DriverError>;

    /// Deregister and release the callback for `channel`.
    fn unsubscribe(&mut self, channel: Channel);

    /// Register a handler for an unsolicited disconnect.
    fn on_disconnect(&mut self, callback: DisconnectCallback);

    /// Tear down the connection and all remaining subscriptions.
    fn disconnect(&mut self);
}

/// Errors surfaced by a sensor driver.
#[derive(Debug)]
pub enum DriverError {
    /// The device could not be reached
    Unreachable(String),
    /// The operation requires an established connection
    NotConnected,
    /// The requested channel/rate combination exceeds hardware capability
    UnsupportedRate { channel: Channel, rate_hz: f32 },
    /// The channel already has a registered callback
    AlreadySubscribed(Channel),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Unreachable(msg) => write!(f, "device unreachable: {msg}"),
            DriverError::NotConnected => write!(f, "device is not connected"),
            DriverError::UnsupportedRate { channel, rate_hz } => {
                write!(f, "unsupported rate {rate_hz} Hz for channel {channel}")
            }
            DriverError::AlreadySubscribed(channel) => {
                write!(f, "channel {channel} is already subscribed")
            }
        }
    }
}

impl std::error::Error for DriverError {}
