//! Session registry persisted alongside the recorded data.
//!
//! One record per recording session, so downstream processing can find
//! files that have not been analyzed yet. Stored as pretty JSON in the data
//! directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One recording session, from connect to disconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session identifier
    pub id: Uuid,
    /// Address of the wearable this session recorded from
    pub device_address: String,
    /// Host the recording ran on
    pub host: Option<String>,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// When the session ended; `None` while recording
    pub ended_at: Option<DateTime<Utc>>,
    /// Session output file
    pub output_file: PathBuf,
    /// Rows written to the output file
    pub rows_written: u64,
    /// Whether downstream processing has consumed this session
    pub processed: bool,
}

/// JSON-backed store of session records.
pub struct MetadataStore {
    path: PathBuf,
    records: Vec<SessionRecord>,
}

impl MetadataStore {
    /// Open the store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        let path = path.into();
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| MetadataError::IoError(e.to_string()))?;
            serde_json::from_str(&content).map_err(|e| MetadataError::ParseError(e.to_string()))?
        } else {
            Vec::new()
        };

        Ok(Self { path, records })
    }

    /// Register a new session and return its id.
    pub fn begin_session(
        &mut self,
        device_address: &str,
        output_file: &Path,
    ) -> Result<Uuid, MetadataError> {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            device_address: device_address.to_string(),
            host: hostname::get().ok().and_then(|h| h.into_string().ok()),
            started_at: Utc::now(),
            ended_at: None,
            output_file: output_file.to_path_buf(),
            rows_written: 0,
            processed: false,
        };
        let id = record.id;
        self.records.push(record);
        self.save()?;
        Ok(id)
    }

    /// Mark a session as ended and record its final row count.
    pub fn complete_session(&mut self, id: Uuid, rows_written: u64) -> Result<(), MetadataError> {
        let record = self.record_mut(id)?;
        record.ended_at = Some(Utc::now());
        record.rows_written = rows_written;
        self.save()
    }

    /// Mark a session as consumed by downstream processing.
    pub fn mark_processed(&mut self, id: Uuid) -> Result<(), MetadataError> {
        self.record_mut(id)?.processed = true;
        self.save()
    }

    /// All known sessions, oldest first.
    pub fn sessions(&self) -> &[SessionRecord] {
        &self.records
    }

    /// Completed sessions not yet consumed by downstream processing.
    pub fn unprocessed(&self) -> Vec<&SessionRecord> {
        self.records
            .iter()
            .filter(|r| !r.processed && r.ended_at.is_some())
            .collect()
    }

    fn record_mut(&mut self, id: Uuid) -> Result<&mut SessionRecord, MetadataError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(MetadataError::UnknownSession(id))
    }

    fn save(&self) -> Result<(), MetadataError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MetadataError::IoError(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&self.records)
            .map_err(|e| MetadataError::SerializeError(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| MetadataError::IoError(e.to_string()))
    }
}

/// Session registry errors.
#[derive(Debug)]
pub enum MetadataError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    UnknownSession(Uuid),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::IoError(e) => write!(f, "IO error: {e}"),
            MetadataError::ParseError(e) => write!(f, "Parse error: {e}"),
            MetadataError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            MetadataError::UnknownSession(id) => write!(f, "unknown session: {id}"),
        }
    }
}

impl std::error::Error for MetadataError {}
