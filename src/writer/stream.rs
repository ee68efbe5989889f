//! Buffered append-only writer for session rows.
//!
//! Rows accumulate in memory and are flushed once the pending row count or
//! pending byte length reaches its bound, whichever triggers first. The
//! bounds default to small values: batching here is a bounded concession to
//! syscall overhead, not a durability optimization, so data should reach the
//! OS quickly.

use crate::bridge::types::{Sample, SampleValues};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header written at the top of every session file.
///
/// Row format is a stable contract with downstream processing: a
/// millisecond-resolution epoch timestamp, the channel tag, then one value
/// column per channel width, four decimal digits each.
pub const ROW_HEADER: &str = "timestamp,channel,values";

/// Bounds controlling when pending rows are flushed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlushPolicy {
    /// Flush once this many rows are pending
    pub max_rows: usize,
    /// Flush once the pending rows reach this many bytes
    pub max_bytes: usize,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            max_rows: 16,
            max_bytes: 4096,
        }
    }
}

/// Appends formatted sample rows to a per-session file.
///
/// The writer exclusively owns its file for the session. It is single-owner
/// and unsynchronized; concurrent driver callbacks are serialized upstream by
/// the bridge's channel before samples reach [`write`].
///
/// [`write`]: StreamWriter::write
pub struct StreamWriter {
    path: PathBuf,
    file: Option<File>,
    pending: String,
    pending_rows: usize,
    policy: FlushPolicy,
    rows_written: u64,
}

impl StreamWriter {
    /// Create the session file and write the header row.
    pub fn create(path: impl Into<PathBuf>, policy: FlushPolicy) -> Result<Self, WriteError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WriteError::Create(e.to_string()))?;
        }
        let mut file = File::create(&path).map_err(|e| WriteError::Create(e.to_string()))?;
        writeln!(file, "{ROW_HEADER}").map_err(|e| WriteError::Create(e.to_string()))?;

        Ok(Self {
            path,
            file: Some(file),
            pending: String::new(),
            pending_rows: 0,
            policy,
            rows_written: 0,
        })
    }

    /// Queue one sample, flushing when a policy bound is reached.
    pub fn write(&mut self, sample: &Sample) -> Result<(), WriteError> {
        if self.file.is_none() {
            return Err(WriteError::Closed);
        }
        format_row(&mut self.pending, sample);
        self.pending_rows += 1;

        if self.pending_rows >= self.policy.max_rows || self.pending.len() >= self.policy.max_bytes
        {
            self.flush()?;
        }
        Ok(())
    }

    /// Write all pending rows to the file.
    ///
    /// On I/O failure the rows of this attempt are lost; the error reports
    /// how many, and the caller decides whether the session survives.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let Some(file) = self.file.as_mut() else {
            return Err(WriteError::Closed);
        };

        let rows = self.pending_rows;
        let result = file.write_all(self.pending.as_bytes());
        self.pending.clear();
        self.pending_rows = 0;

        match result {
            Ok(()) => {
                self.rows_written += rows as u64;
                Ok(())
            }
            Err(e) => Err(WriteError::Io {
                rows_lost: rows,
                message: e.to_string(),
            }),
        }
    }

    /// Flush remaining rows and release the file handle.
    ///
    /// Idempotent: a second call produces no duplicate rows and no error.
    /// The handle is released even when the final flush fails.
    pub fn close(&mut self) -> Result<(), WriteError> {
        if self.file.is_none() {
            return Ok(());
        }
        let result = self.flush();
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
        result
    }

    /// Whether the writer has been closed.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Rows flushed to the file so far (excludes pending rows).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows buffered but not yet flushed.
    pub fn pending_rows(&self) -> usize {
        self.pending_rows
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StreamWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Append one formatted row: millisecond epoch timestamp, channel tag,
/// values to four decimal digits.
fn format_row(out: &mut String, sample: &Sample) {
    use std::fmt::Write;

    let _ = write!(out, "{:.3},{}", sample.epoch_secs(), sample.channel.tag());
    match sample.values {
        SampleValues::Axes { x, y, z } => {
            let _ = write!(out, ",{x:.4},{y:.4},{z:.4}");
        }
        SampleValues::Scalar(v) => {
            let _ = write!(out, ",{v:.4}");
        }
    }
    out.push('\n');
}

/// Errors surfaced by the stream writer.
#[derive(Debug)]
pub enum WriteError {
    /// The writer was already closed
    Closed,
    /// The session file could not be created
    Create(String),
    /// Flushing failed; the rows of that attempt are lost
    Io { rows_lost: usize, message: String },
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Closed => write!(f, "stream writer is closed"),
            WriteError::Create(msg) => write!(f, "could not create session file: {msg}"),
            WriteError::Io { rows_lost, message } => {
                write!(f, "write failed, {rows_lost} buffered rows lost: {message}")
            }
        }
    }
}

impl std::error::Error for WriteError {}
