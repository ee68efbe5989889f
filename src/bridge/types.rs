//! Sample types produced by the sensor bridge.
//!
//! Each sample carries a driver-supplied timestamp, its originating channel,
//! and a fixed-width numeric payload for that channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical measurement channel on the wearable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Triaxial accelerometer
    Accel,
    /// Triaxial gyroscope
    Gyro,
    /// Skin thermometer
    Temp,
}

impl Channel {
    /// Stable lowercase tag used in output rows and CLI parsing.
    pub fn tag(&self) -> &'static str {
        match self {
            Channel::Accel => "accel",
            Channel::Gyro => "gyro",
            Channel::Temp => "temp",
        }
    }

    /// Physical unit of the channel's values.
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Accel => "g",
            Channel::Gyro => "deg/s",
            Channel::Temp => "degC",
        }
    }

    /// Number of value columns this channel emits per row.
    pub fn width(&self) -> usize {
        match self {
            Channel::Accel | Channel::Gyro => 3,
            Channel::Temp => 1,
        }
    }

    /// All channels, in row-tag order.
    pub fn all() -> [Channel; 3] {
        [Channel::Accel, Channel::Gyro, Channel::Temp]
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Fixed-width numeric payload of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValues {
    /// Triaxial reading (accelerometer, gyroscope)
    Axes { x: f32, y: f32, z: f32 },
    /// Single reading (thermometer)
    Scalar(f32),
}

/// One timestamped measurement delivered by the driver.
///
/// Immutable once produced; consumed exactly once by the stream writer and
/// never retained after being written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp of the measurement
    pub timestamp: DateTime<Utc>,
    /// Originating channel
    pub channel: Channel,
    /// Channel payload
    pub values: SampleValues,
}

impl Sample {
    /// Create an accelerometer sample stamped with the current time.
    pub fn accel(x: f32, y: f32, z: f32) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: Channel::Accel,
            values: SampleValues::Axes { x, y, z },
        }
    }

    /// Create a gyroscope sample stamped with the current time.
    pub fn gyro(x: f32, y: f32, z: f32) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: Channel::Gyro,
            values: SampleValues::Axes { x, y, z },
        }
    }

    /// Create a thermometer sample stamped with the current time.
    pub fn temp(value: f32) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: Channel::Temp,
            values: SampleValues::Scalar(value),
        }
    }

    /// Create a sample with an explicit driver timestamp.
    pub fn with_timestamp(timestamp: DateTime<Utc>, channel: Channel, values: SampleValues) -> Self {
        Self {
            timestamp,
            channel,
            values,
        }
    }

    /// Timestamp as fractional seconds since the Unix epoch, millisecond
    /// resolution.
    pub fn epoch_secs(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }
}
