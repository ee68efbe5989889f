//! Somnolog CLI
//!
//! Records wearable sensor sessions to per-session flat files. The bundled
//! binary streams from the built-in signal-generator driver; a vendor BLE
//! transport plugs in through the library's `Driver` trait.

use chrono::Utc;
use clap::{Parser, Subcommand};
use somnolog::{
    config::Config,
    metadata::MetadataStore,
    run_session,
    stats::create_shared_stats_with_persistence,
    ChannelConfig, SensorBridge, SessionError, SimulatedDriver, StreamWriter, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "somnolog")]
#[command(version = VERSION)]
#[command(about = "BLE wearable sensor streamer for sleep-quality research", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a sensor session to a flat file
    Record {
        /// Device address to record from
        #[arg(long, default_value = "C4:7C:8D:6A:00:01")]
        address: String,

        /// Channels to stream (accel, gyro, temp, or all)
        #[arg(long, default_value = "accel,gyro")]
        channels: String,

        /// Accelerometer notification rate in Hz
        #[arg(long, default_value = "50.0")]
        accel_rate: f32,

        /// Gyroscope notification rate in Hz
        #[arg(long, default_value = "50.0")]
        gyro_rate: f32,

        /// Thermometer notification rate in Hz
        #[arg(long, default_value = "1.0")]
        temp_rate: f32,

        /// Output file (defaults to a timestamped file in the session directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Flush after this many buffered rows
        #[arg(long)]
        flush_rows: Option<usize>,

        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Show configuration and cumulative recording statistics
    Status,

    /// List recorded sessions
    Sessions {
        /// Only show sessions not yet consumed by downstream processing
        #[arg(long)]
        unprocessed: bool,
    },

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            address,
            channels,
            accel_rate,
            gyro_rate,
            temp_rate,
            output,
            flush_rows,
            duration,
        } => {
            cmd_record(
                &address,
                &channels,
                accel_rate,
                gyro_rate,
                temp_rate,
                output,
                flush_rows,
                duration,
            );
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Sessions { unprocessed } => {
            cmd_sessions(unprocessed);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_record(
    address: &str,
    channels: &str,
    accel_rate: f32,
    gyro_rate: f32,
    temp_rate: f32,
    output: Option<PathBuf>,
    flush_rows: Option<usize>,
    duration: Option<u64>,
) {
    println!("Somnolog v{VERSION}");
    println!();

    // Parse channel configuration
    let mut channel_config = ChannelConfig::from_csv(channels);
    channel_config.accel_rate_hz = accel_rate;
    channel_config.gyro_rate_hz = gyro_rate;
    channel_config.temp_rate_hz = temp_rate;
    if !channel_config.any_enabled() {
        eprintln!("Error: At least one channel must be enabled (accel, gyro, or temp)");
        std::process::exit(1);
    }

    // Load or create configuration
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let mut flush = config.flush;
    if let Some(rows) = flush_rows {
        flush.max_rows = rows.max(1);
    }

    let output_path = output.unwrap_or_else(|| {
        config
            .session_path
            .join(format!("session_{}.csv", Utc::now().format("%Y%m%d_%H%M%S")))
    });

    println!("Starting recording...");
    println!("  Device: {address}");
    for (channel, rate_hz) in channel_config.enabled() {
        println!("  {channel} ({}): {rate_hz} Hz", channel.unit());
    }
    println!("  Output: {output_path:?}");
    println!("  Flush policy: {} rows / {} bytes", flush.max_rows, flush.max_bytes);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up cumulative statistics
    let stats = create_shared_stats_with_persistence(config.data_path.join("stats.json"));

    // Register the session
    let mut metadata = match MetadataStore::open(config.data_path.join("sessions.json")) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("Warning: Could not open session registry: {e}");
            None
        }
    };
    let session_id = metadata
        .as_mut()
        .and_then(|m| match m.begin_session(address, &output_path) {
            Ok(id) => Some(id),
            Err(e) => {
                eprintln!("Warning: Could not register session: {e}");
                None
            }
        });

    // Create the writer and bridge
    let mut writer = match StreamWriter::create(&output_path, flush) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("Error creating session file: {e}");
            std::process::exit(1);
        }
    };

    let mut bridge = SensorBridge::new(SimulatedDriver::new(address));
    if let Err(e) = bridge.start(&channel_config) {
        eprintln!("Error starting stream: {e}");
        std::process::exit(1);
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    // Optional bounded run for unattended recordings
    if let Some(secs) = duration {
        let r = running.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            r.store(false, Ordering::SeqCst);
        });
    }

    let result = run_session(&mut bridge, &mut writer, &stats, &running);

    let rows_written = writer.rows_written();
    if let Some(ref mut store) = metadata {
        if let Some(id) = session_id {
            if let Err(e) = store.complete_session(id, rows_written) {
                eprintln!("Warning: Could not update session registry: {e}");
            }
        }
    }
    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save recording stats: {e}");
    }

    println!();
    match result {
        Ok(summary) => {
            println!(
                "Recorded {} rows in {:.1}s to {:?}",
                summary.rows_written, summary.duration_secs, output_path
            );
            if summary.dropped_samples > 0 {
                eprintln!(
                    "Warning: {} samples dropped under backpressure",
                    summary.dropped_samples
                );
            }
            println!();
            println!("{}", stats.summary());
        }
        Err(SessionError::Disconnected { rows_written }) => {
            eprintln!("Error: device disconnected mid-session");
            eprintln!("{rows_written} rows were flushed to {output_path:?} before the drop");
            std::process::exit(1);
        }
        Err(SessionError::Write(e)) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Somnolog Status");
    println!("===============");
    println!();

    println!("Configuration:");
    for (channel, rate_hz) in config.channels.enabled() {
        println!("  {channel}: {rate_hz} Hz");
    }
    println!(
        "  Flush policy: {} rows / {} bytes",
        config.flush.max_rows, config.flush.max_bytes
    );
    println!("  Session directory: {:?}", config.session_path);
    println!();

    // Load and show cumulative stats if available
    let stats_path = config.data_path.join("stats.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(accel) = stats.get("accel_samples") {
                    println!("  Accelerometer samples: {accel}");
                }
                if let Some(gyro) = stats.get("gyro_samples") {
                    println!("  Gyroscope samples: {gyro}");
                }
                if let Some(temp) = stats.get("temp_samples") {
                    println!("  Thermometer samples: {temp}");
                }
                if let Some(rows) = stats.get("rows_flushed") {
                    println!("  Rows flushed: {rows}");
                }
                if let Some(dropped) = stats.get("samples_dropped") {
                    println!("  Samples dropped: {dropped}");
                }
                if let Some(sessions) = stats.get("sessions_recorded") {
                    println!("  Sessions recorded: {sessions}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_sessions(unprocessed_only: bool) {
    let config = Config::load().unwrap_or_default();

    let store = match MetadataStore::open(config.data_path.join("sessions.json")) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening session registry: {e}");
            std::process::exit(1);
        }
    };

    let records: Vec<_> = if unprocessed_only {
        store.unprocessed().into_iter().cloned().collect()
    } else {
        store.sessions().to_vec()
    };

    if records.is_empty() {
        println!("No sessions recorded yet.");
        println!("Run 'somnolog record' to start a session.");
        return;
    }

    for record in records {
        let state = match (&record.ended_at, record.processed) {
            (None, _) => "recording",
            (Some(_), false) => "unprocessed",
            (Some(_), true) => "processed",
        };
        println!(
            "{}  {}  {} rows  {}  {:?}",
            record.id,
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            record.rows_written,
            state,
            record.output_file
        );
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
