//! Demonstration of a hardware-free recording session.
//!
//! This example shows how to:
//! 1. Create a bridge over a driver
//! 2. Start streaming the configured channels
//! 3. Pump samples into a stream writer
//! 4. Inspect the resulting session file
//!
//! Run with: cargo run --example record_demo
//!
//! The bundled signal-generator driver stands in for the vendor BLE
//! transport, so no wearable is required.

use somnolog::{
    run_session, ChannelConfig, FlushPolicy, SensorBridge, SessionStats, SimulatedDriver,
    StreamWriter,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DEMO_SECS: u64 = 15;

fn main() {
    println!("Somnolog - Recording Demo");
    println!("=========================");
    println!();

    let mut channels = ChannelConfig::from_csv("all");
    channels.accel_rate_hz = 50.0;
    channels.gyro_rate_hz = 25.0;
    channels.temp_rate_hz = 1.0;

    let output_path = std::env::temp_dir().join("somnolog_demo_session.csv");
    let mut writer = match StreamWriter::create(&output_path, FlushPolicy::default()) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("Error creating session file: {e}");
            return;
        }
    };

    let mut bridge = SensorBridge::new(SimulatedDriver::new("C4:7C:8D:6A:00:01"));
    if let Err(e) = bridge.start(&channels) {
        eprintln!("Error starting stream: {e}");
        return;
    }

    println!("Recording {DEMO_SECS} seconds of simulated sleep data...");
    println!("Output: {output_path:?}");
    println!();

    // Stop on Ctrl+C or after the demo window
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let r = running.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(DEMO_SECS));
        r.store(false, Ordering::SeqCst);
    });

    let stats = SessionStats::new();
    match run_session(&mut bridge, &mut writer, &stats, &running) {
        Ok(summary) => {
            println!(
                "Recorded {} rows in {:.1}s",
                summary.rows_written, summary.duration_secs
            );
        }
        Err(e) => {
            eprintln!("Session ended with error: {e}");
            return;
        }
    }

    println!();
    println!("{}", stats.summary());
    println!();

    // Show the first few rows of the session file
    if let Ok(content) = std::fs::read_to_string(&output_path) {
        println!("Session file (first 10 rows):");
        for line in content.lines().take(10) {
            println!("  {line}");
        }
        println!("  ...");
    }

    println!();
    println!("Demo complete!");
}
