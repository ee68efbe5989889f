//! Built-in signal-generator driver.
//!
//! Stands in for the vendor SDK so the pipeline runs end to end without
//! hardware: each subscription spawns a thread that synthesizes samples of a
//! resting body at the requested rate. Used by the bundled binary, the demo,
//! and timing-tolerant tests.

use crate::bridge::driver::{DisconnectCallback, Driver, DriverError, SampleCallback};
use crate::bridge::types::{Channel, Sample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Aggregate notification rate the simulated hardware supports.
pub const MAX_AGGREGATE_RATE_HZ: f32 = 100.0;

struct Subscription {
    channel: Channel,
    rate_hz: f32,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// A driver that synthesizes deterministic waveforms per channel.
pub struct SimulatedDriver {
    address: String,
    connected: bool,
    subscriptions: Vec<Subscription>,
    // Retained to honor the driver contract; the generator never drops the link.
    _disconnect_callback: Option<DisconnectCallback>,
}

impl SimulatedDriver {
    /// Create a driver for the device at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connected: false,
            subscriptions: Vec::new(),
            _disconnect_callback: None,
        }
    }

    /// Device address this driver was created for.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn aggregate_rate_hz(&self) -> f32 {
        self.subscriptions.iter().map(|s| s.rate_hz).sum()
    }
}

impl Driver for SimulatedDriver {
    fn connect(&mut self) -> Result<(), DriverError> {
        if self.address.trim().is_empty() {
            return Err(DriverError::Unreachable("empty device address".into()));
        }
        self.connected = true;
        Ok(())
    }

    fn subscribe(
        &mut self,
        channel: Channel,
        rate_hz: f32,
        callback: SampleCallback,
    ) -> Result<(), DriverError> {
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        if self.subscriptions.iter().any(|s| s.channel == channel) {
            return Err(DriverError::AlreadySubscribed(channel));
        }
        if rate_hz <= 0.0 || self.aggregate_rate_hz() + rate_hz > MAX_AGGREGATE_RATE_HZ {
            return Err(DriverError::UnsupportedRate { channel, rate_hz });
        }

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz));

        let handle = thread::spawn(move || {
            let mut tick: u64 = 0;
            while thread_running.load(Ordering::SeqCst) {
                callback(synthesize(channel, tick));
                tick += 1;
                thread::sleep(period);
            }
        });

        self.subscriptions.push(Subscription {
            channel,
            rate_hz,
            running,
            handle: Some(handle),
        });
        Ok(())
    }

    fn unsubscribe(&mut self, channel: Channel) {
        if let Some(pos) = self.subscriptions.iter().position(|s| s.channel == channel) {
            let mut subscription = self.subscriptions.remove(pos);
            subscription.running.store(false, Ordering::SeqCst);
            if let Some(handle) = subscription.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn on_disconnect(&mut self, callback: DisconnectCallback) {
        self._disconnect_callback = Some(callback);
    }

    fn disconnect(&mut self) {
        let channels: Vec<Channel> = self.subscriptions.iter().map(|s| s.channel).collect();
        for channel in channels {
            self.unsubscribe(channel);
        }
        self.connected = false;
    }
}

impl Drop for SimulatedDriver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Synthesize one sample of a sleeping body.
///
/// Accelerometer sits near 1 g on the z axis with breathing-scale wobble,
/// the gyroscope shows small slow rotation, and skin temperature drifts
/// around 31 degC.
fn synthesize(channel: Channel, tick: u64) -> Sample {
    let phase = tick as f32 * 0.05;
    match channel {
        Channel::Accel => Sample::accel(
            0.013 * phase.sin(),
            0.011 * (phase * 0.7).cos(),
            1.0 + 0.008 * (phase * 1.3).sin(),
        ),
        Channel::Gyro => Sample::gyro(
            0.4 * (phase * 0.3).sin(),
            0.3 * (phase * 0.4).cos(),
            0.2 * (phase * 0.2).sin(),
        ),
        Channel::Temp => Sample::temp(31.0 + 0.5 * (tick as f32 * 0.001).sin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_connect_requires_address() {
        let mut driver = SimulatedDriver::new("");
        assert!(matches!(
            driver.connect(),
            Err(DriverError::Unreachable(_))
        ));
    }

    #[test]
    fn test_subscribe_requires_connection() {
        let mut driver = SimulatedDriver::new("C4:7C:8D:6A:00:01");
        let result = driver.subscribe(Channel::Accel, 50.0, Box::new(|_| {}));
        assert!(matches!(result, Err(DriverError::NotConnected)));
    }

    #[test]
    fn test_aggregate_rate_cap() {
        let mut driver = SimulatedDriver::new("C4:7C:8D:6A:00:01");
        driver.connect().unwrap();
        driver
            .subscribe(Channel::Accel, 80.0, Box::new(|_| {}))
            .unwrap();
        let result = driver.subscribe(Channel::Gyro, 50.0, Box::new(|_| {}));
        assert!(matches!(
            result,
            Err(DriverError::UnsupportedRate { .. })
        ));
        driver.disconnect();
    }

    #[test]
    fn test_duplicate_subscription_rejected() {
        let mut driver = SimulatedDriver::new("C4:7C:8D:6A:00:01");
        driver.connect().unwrap();
        driver
            .subscribe(Channel::Temp, 1.0, Box::new(|_| {}))
            .unwrap();
        let result = driver.subscribe(Channel::Temp, 1.0, Box::new(|_| {}));
        assert!(matches!(
            result,
            Err(DriverError::AlreadySubscribed(Channel::Temp))
        ));
        driver.disconnect();
    }

    #[test]
    fn test_delivers_samples_until_unsubscribed() {
        let collected: Arc<Mutex<Vec<Sample>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = collected.clone();

        let mut driver = SimulatedDriver::new("C4:7C:8D:6A:00:01");
        driver.connect().unwrap();
        driver
            .subscribe(
                Channel::Accel,
                50.0,
                Box::new(move |sample| sink.lock().unwrap().push(sample)),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(300));
        driver.unsubscribe(Channel::Accel);

        let samples = collected.lock().unwrap();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.channel == Channel::Accel));
    }
}
