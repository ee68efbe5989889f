//! Integration tests for the recording pipeline.
//!
//! A scripted driver delivers its samples synchronously during `subscribe`,
//! so the tests are deterministic: everything the driver produced is queued
//! on the bridge before the session pump runs.

use chrono::{TimeZone, Utc};
use somnolog::{
    bridge::{DisconnectCallback, Driver, DriverError, SampleCallback},
    run_session, Channel, ChannelConfig, FlushPolicy, Sample, SampleValues, SensorBridge,
    SessionError, SessionStats, StreamWriter, ROW_HEADER,
};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

/// Driver that pushes a fixed script of samples through the channel
/// callbacks as soon as they are registered, then optionally reports a
/// dropped link.
struct ScriptedDriver {
    samples: Vec<Sample>,
    disconnect_after_delivery: bool,
    fail_connect: bool,
    disconnect_callback: Option<DisconnectCallback>,
    subscribed: Vec<Channel>,
}

impl ScriptedDriver {
    fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            disconnect_after_delivery: false,
            fail_connect: false,
            disconnect_callback: None,
            subscribed: Vec::new(),
        }
    }

    fn disconnecting(samples: Vec<Sample>) -> Self {
        Self {
            disconnect_after_delivery: true,
            ..Self::new(samples)
        }
    }
}

impl Driver for ScriptedDriver {
    fn connect(&mut self) -> Result<(), DriverError> {
        if self.fail_connect {
            return Err(DriverError::Unreachable("scripted failure".into()));
        }
        Ok(())
    }

    fn subscribe(
        &mut self,
        channel: Channel,
        _rate_hz: f32,
        callback: SampleCallback,
    ) -> Result<(), DriverError> {
        for sample in self.samples.iter().filter(|s| s.channel == channel) {
            callback(sample.clone());
        }
        self.subscribed.push(channel);

        if self.disconnect_after_delivery {
            if let Some(ref on_disconnect) = self.disconnect_callback {
                on_disconnect();
            }
        }
        Ok(())
    }

    fn unsubscribe(&mut self, channel: Channel) {
        self.subscribed.retain(|c| *c != channel);
    }

    fn on_disconnect(&mut self, callback: DisconnectCallback) {
        self.disconnect_callback = Some(callback);
    }

    fn disconnect(&mut self) {
        self.subscribed.clear();
    }
}

fn accel_script(count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| {
            let timestamp = Utc
                .timestamp_millis_opt(1_650_667_624_000 + i as i64 * 10)
                .unwrap();
            Sample::with_timestamp(
                timestamp,
                Channel::Accel,
                SampleValues::Axes {
                    x: 0.0132,
                    y: -0.0054,
                    z: 0.9981,
                },
            )
        })
        .collect()
}

fn accel_only() -> ChannelConfig {
    ChannelConfig::from_csv("accel")
}

fn test_output(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "somnolog-recording-{}-{}.csv",
        std::process::id(),
        name
    ))
}

fn data_lines(path: &PathBuf) -> Vec<String> {
    let content = std::fs::read_to_string(path).expect("session file readable");
    let mut lines = content.lines().map(str::to_string);
    assert_eq!(lines.next().as_deref(), Some(ROW_HEADER));
    lines.collect()
}

#[test]
fn test_ten_thousand_samples_land_in_order() {
    let path = test_output("ten-thousand");
    let mut bridge = SensorBridge::new(ScriptedDriver::new(accel_script(10_000)));
    let mut writer = StreamWriter::create(&path, FlushPolicy::default()).unwrap();
    let stats = SessionStats::new();

    bridge.start(&accel_only()).unwrap();

    // The script is fully queued; the pump only needs the drain phase.
    let running = AtomicBool::new(false);
    let summary = run_session(&mut bridge, &mut writer, &stats, &running).unwrap();

    assert_eq!(summary.rows_written, 10_000);
    assert_eq!(summary.dropped_samples, 0);

    let rows = data_lines(&path);
    assert_eq!(rows.len(), 10_000);

    let timestamps: Vec<f64> = rows
        .iter()
        .map(|row| row.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert!(timestamps.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(rows.iter().all(|row| row.split(',').count() == 5));
    assert!(rows.iter().all(|row| row.split(',').nth(1) == Some("accel")));

    let snapshot = stats.stats();
    assert_eq!(snapshot.accel_samples, 10_000);
    assert_eq!(snapshot.rows_flushed, 10_000);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_disconnect_mid_session_flushes_and_surfaces() {
    let path = test_output("disconnect");
    let mut bridge = SensorBridge::new(ScriptedDriver::disconnecting(accel_script(500)));
    let mut writer = StreamWriter::create(&path, FlushPolicy::default()).unwrap();
    let stats = SessionStats::new();

    bridge.start(&accel_only()).unwrap();

    let running = AtomicBool::new(true);
    let result = run_session(&mut bridge, &mut writer, &stats, &running);

    match result {
        Err(SessionError::Disconnected { rows_written }) => {
            assert_eq!(rows_written, 500);
        }
        other => panic!("expected disconnect error, got {other:?}"),
    }

    // Everything received before the drop reached disk.
    let rows = data_lines(&path);
    assert_eq!(rows.len(), 500);
    assert!(writer.is_closed());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_connect_failure_surfaces_before_any_file_rows() {
    let mut driver = ScriptedDriver::new(accel_script(10));
    driver.fail_connect = true;
    let mut bridge = SensorBridge::new(driver);

    let result = bridge.start(&accel_only());
    assert!(result.is_err());
    assert!(!bridge.is_streaming());
}

#[test]
fn test_multi_channel_arrival_order_is_preserved_per_channel() {
    let path = test_output("multi-channel");

    let mut samples = accel_script(100);
    for i in 0..100u64 {
        let timestamp = Utc
            .timestamp_millis_opt(1_650_667_624_003 + i as i64 * 10)
            .unwrap();
        samples.push(Sample::with_timestamp(
            timestamp,
            Channel::Gyro,
            SampleValues::Axes {
                x: 0.42,
                y: -0.17,
                z: 0.08,
            },
        ));
    }
    samples.push(Sample::with_timestamp(
        Utc.timestamp_millis_opt(1_650_667_625_000).unwrap(),
        Channel::Temp,
        SampleValues::Scalar(31.2),
    ));

    let mut bridge = SensorBridge::new(ScriptedDriver::new(samples));
    let mut writer = StreamWriter::create(&path, FlushPolicy::default()).unwrap();
    let stats = SessionStats::new();

    let mut channels = ChannelConfig::from_csv("all");
    channels.accel_rate_hz = 50.0;
    channels.gyro_rate_hz = 25.0;
    channels.temp_rate_hz = 1.0;
    bridge.start(&channels).unwrap();

    let running = AtomicBool::new(false);
    let summary = run_session(&mut bridge, &mut writer, &stats, &running).unwrap();
    assert_eq!(summary.rows_written, 201);

    let rows = data_lines(&path);
    assert_eq!(rows.len(), 201);

    // Rows of each channel keep their own arrival order.
    for tag in ["accel", "gyro"] {
        let timestamps: Vec<f64> = rows
            .iter()
            .filter(|row| row.split(',').nth(1) == Some(tag))
            .map(|row| row.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(timestamps.len(), 100);
        assert!(timestamps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    // Scalar channels emit one value column, triaxial channels three.
    let temp_row = rows
        .iter()
        .find(|row| row.split(',').nth(1) == Some("temp"))
        .unwrap();
    assert_eq!(temp_row.split(',').count(), 3);

    let snapshot = stats.stats();
    assert_eq!(snapshot.accel_samples, 100);
    assert_eq!(snapshot.gyro_samples, 100);
    assert_eq!(snapshot.temp_samples, 1);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_row_values_round_trip_within_tolerance() {
    let path = test_output("round-trip");

    let timestamp = Utc.timestamp_millis_opt(1_650_667_624_971).unwrap();
    let samples = vec![Sample::with_timestamp(
        timestamp,
        Channel::Accel,
        SampleValues::Axes {
            x: 0.013_254,
            y: -1.204_9,
            z: 0.998_131,
        },
    )];

    let mut bridge = SensorBridge::new(ScriptedDriver::new(samples));
    let mut writer = StreamWriter::create(&path, FlushPolicy::default()).unwrap();
    let stats = SessionStats::new();

    bridge.start(&accel_only()).unwrap();
    let running = AtomicBool::new(false);
    run_session(&mut bridge, &mut writer, &stats, &running).unwrap();

    let rows = data_lines(&path);
    let fields: Vec<&str> = rows[0].split(',').collect();

    let parsed_ts: f64 = fields[0].parse().unwrap();
    assert!((parsed_ts - 1_650_667_624.971).abs() < 1e-3);

    let parsed: Vec<f64> = fields[2..].iter().map(|v| v.parse().unwrap()).collect();
    assert!((parsed[0] - 0.013_254).abs() < 1e-4);
    assert!((parsed[1] + 1.204_9).abs() < 1e-4);
    assert!((parsed[2] - 0.998_131).abs() < 1e-4);

    std::fs::remove_file(&path).unwrap();
}
