//! Cumulative recording statistics.
//!
//! Tracks how many samples each channel delivered, how many rows reached
//! disk, and how many samples were dropped under backpressure, across
//! sessions. Counters persist as JSON in the data directory.

use crate::bridge::types::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current and previous recording sessions.
#[derive(Debug)]
pub struct SessionStats {
    /// Accelerometer samples received
    accel_samples: AtomicU64,
    /// Gyroscope samples received
    gyro_samples: AtomicU64,
    /// Thermometer samples received
    temp_samples: AtomicU64,
    /// Rows flushed to session files
    rows_flushed: AtomicU64,
    /// Samples dropped because the queue was full
    samples_dropped: AtomicU64,
    /// Sessions completed
    sessions_recorded: AtomicU64,
    /// Start time of the current session
    session_start: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl SessionStats {
    /// Create fresh statistics.
    pub fn new() -> Self {
        Self {
            accel_samples: AtomicU64::new(0),
            gyro_samples: AtomicU64::new(0),
            temp_samples: AtomicU64::new(0),
            rows_flushed: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            sessions_recorded: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create statistics with persistence, resuming previous counters.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            eprintln!("Note: Could not load previous recording stats: {e}");
        }

        stats
    }

    /// Record one received sample.
    pub fn record_sample(&self, channel: Channel) {
        match channel {
            Channel::Accel => self.accel_samples.fetch_add(1, Ordering::Relaxed),
            Channel::Gyro => self.gyro_samples.fetch_add(1, Ordering::Relaxed),
            Channel::Temp => self.temp_samples.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record rows flushed to a session file.
    pub fn record_rows_flushed(&self, count: u64) {
        self.rows_flushed.fetch_add(count, Ordering::Relaxed);
    }

    /// Record samples dropped under backpressure.
    pub fn record_dropped_samples(&self, count: u64) {
        self.samples_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a completed session.
    pub fn record_session_completed(&self) {
        self.sessions_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            accel_samples: self.accel_samples.load(Ordering::Relaxed),
            gyro_samples: self.gyro_samples.load(Ordering::Relaxed),
            temp_samples: self.temp_samples.load(Ordering::Relaxed),
            rows_flushed: self.rows_flushed.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            sessions_recorded: self.sessions_recorded.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Recording Statistics:\n\
             - Accelerometer samples: {}\n\
             - Gyroscope samples: {}\n\
             - Thermometer samples: {}\n\
             - Rows flushed to disk: {}\n\
             - Samples dropped: {}\n\
             - Sessions recorded: {}\n\
             - Session duration: {} seconds",
            stats.accel_samples,
            stats.gyro_samples,
            stats.temp_samples,
            stats.rows_flushed,
            stats.samples_dropped,
            stats.sessions_recorded,
            stats.session_duration_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                accel_samples: stats.accel_samples,
                gyro_samples: stats.gyro_samples,
                temp_samples: stats.temp_samples,
                rows_flushed: stats.rows_flushed,
                samples_dropped: stats.samples_dropped,
                sessions_recorded: stats.sessions_recorded,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load counters from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.accel_samples
                    .store(persisted.accel_samples, Ordering::Relaxed);
                self.gyro_samples
                    .store(persisted.gyro_samples, Ordering::Relaxed);
                self.temp_samples
                    .store(persisted.temp_samples, Ordering::Relaxed);
                self.rows_flushed
                    .store(persisted.rows_flushed, Ordering::Relaxed);
                self.samples_dropped
                    .store(persisted.samples_dropped, Ordering::Relaxed);
                self.sessions_recorded
                    .store(persisted.sessions_recorded, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.accel_samples.store(0, Ordering::Relaxed);
        self.gyro_samples.store(0, Ordering::Relaxed);
        self.temp_samples.store(0, Ordering::Relaxed);
        self.rows_flushed.store(0, Ordering::Relaxed);
        self.samples_dropped.store(0, Ordering::Relaxed);
        self.sessions_recorded.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of recording statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub accel_samples: u64,
    pub gyro_samples: u64,
    pub temp_samples: u64,
    pub rows_flushed: u64,
    pub samples_dropped: u64,
    pub sessions_recorded: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Counter format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    accel_samples: u64,
    gyro_samples: u64,
    temp_samples: u64,
    rows_flushed: u64,
    samples_dropped: u64,
    sessions_recorded: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create new shared statistics.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

/// Create new shared statistics with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedSessionStats {
    Arc::new(SessionStats::with_persistence(path))
}
