//! Session pump: drains bridge samples into the stream writer.
//!
//! One logical writer is active per session. The pump is the single consumer
//! of the bridge's sample queue, so concurrent driver callbacks are already
//! serialized by the time rows are appended.

use crate::bridge::{Driver, SensorBridge};
use crate::stats::SessionStats;
use crate::writer::{StreamWriter, WriteError};
use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long the pump waits for a sample before re-checking its exit flags.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Outcome of a completed recording session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Rows flushed to the session file
    pub rows_written: u64,
    /// Samples dropped because the queue was full
    pub dropped_samples: u64,
    /// Wall-clock duration of the pump loop
    pub duration_secs: f64,
}

/// Errors that end a recording session.
#[derive(Debug)]
pub enum SessionError {
    /// The device dropped the link; rows already received were flushed
    Disconnected { rows_written: u64 },
    /// The destination became unwritable
    Write(WriteError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Disconnected { rows_written } => {
                write!(
                    f,
                    "device disconnected mid-session after {rows_written} rows were written"
                )
            }
            SessionError::Write(e) => write!(f, "session write failed: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Drain samples from `bridge` into `writer` until `running` clears or the
/// device disconnects.
///
/// Every exit path stops the bridge, drains samples that were already
/// queued, and closes the writer, so the session file is released even when
/// an error propagates. A mid-session disconnect is surfaced as
/// [`SessionError::Disconnected`] after everything received has been
/// flushed; a write failure aborts the session with the reported row loss.
pub fn run_session<D: Driver>(
    bridge: &mut SensorBridge<D>,
    writer: &mut StreamWriter,
    stats: &SessionStats,
    running: &AtomicBool,
) -> Result<SessionSummary, SessionError> {
    let started = Instant::now();
    let receiver = bridge.samples().clone();

    let mut failure: Option<SessionError> = None;
    let mut disconnected = false;

    while running.load(Ordering::SeqCst) && failure.is_none() {
        if bridge.is_disconnected() {
            disconnected = true;
            break;
        }

        match receiver.recv_timeout(RECV_TIMEOUT) {
            Ok(sample) => {
                stats.record_sample(sample.channel);
                if let Err(e) = writer.write(&sample) {
                    failure = Some(SessionError::Write(e));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                disconnected = true;
                break;
            }
        }
    }

    bridge.stop();

    // Flush whatever was queued before the stop, then release the file on
    // every path.
    if failure.is_none() {
        while let Ok(sample) = receiver.try_recv() {
            stats.record_sample(sample.channel);
            if let Err(e) = writer.write(&sample) {
                failure = Some(SessionError::Write(e));
                break;
            }
        }
    }

    let close_result = writer.close();
    if failure.is_none() {
        if let Err(e) = close_result {
            failure = Some(SessionError::Write(e));
        }
    }

    let dropped = bridge.dropped_samples();
    stats.record_rows_flushed(writer.rows_written());
    if dropped > 0 {
        stats.record_dropped_samples(dropped);
    }

    if let Some(err) = failure {
        return Err(err);
    }
    if disconnected {
        return Err(SessionError::Disconnected {
            rows_written: writer.rows_written(),
        });
    }

    stats.record_session_completed();
    Ok(SessionSummary {
        rows_written: writer.rows_written(),
        dropped_samples: dropped,
        duration_secs: started.elapsed().as_secs_f64(),
    })
}
