//! Stream writer module.
//!
//! Persists samples to a per-session flat file with bounded buffering.
//! Write-only and append-only: nothing reads the file back during a session.

pub mod stream;

// Re-export commonly used types
pub use stream::{FlushPolicy, StreamWriter, WriteError, ROW_HEADER};
