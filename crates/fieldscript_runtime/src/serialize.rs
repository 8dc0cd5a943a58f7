//! Session snapshots in `MessagePack`.
//!
//! A snapshot holds logical state only: the field, each instance's
//! execution point, pending timers and the raw bytes of every registered
//! script, plus the bytes of replaced scripts that instances still run.
//! Programs are decoded again on restore.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use fieldscript_engine::{InstanceId, SchedulerSnapshot};
use fieldscript_foundation::{Error, ErrorKind, Result};
use fieldscript_storage::FieldState;
use serde::{Deserialize, Serialize};

/// Saved state of a [`Session`](crate::Session).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Field memory, flags and entities.
    pub field: FieldState,
    /// Instance execution points.
    pub scheduler: SchedulerSnapshot,
    /// Script name to source bytes.
    pub scripts: Vec<(String, Vec<u8>)>,
    /// Source bytes for instances still running a replaced script.
    #[serde(default)]
    pub detached: Vec<(InstanceId, Vec<u8>)>,
    /// Release tick of each timer-suspended instance.
    pub timers: Vec<(InstanceId, u64)>,
}

/// Serializes a snapshot to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(snapshot: &SessionSnapshot) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(snapshot)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Deserializes a snapshot from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<SessionSnapshot> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Saves a snapshot to a file, replacing it if it exists.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(snapshot: &SessionSnapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let io_error = |what: &str, e: std::io::Error| {
        Error::new(ErrorKind::IoError(format!(
            "failed to {what} '{}': {e}",
            path.display()
        )))
    };

    let file = File::create(path).map_err(|e| io_error("create file", e))?;
    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(snapshot)?;
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to file", e))?;
    writer.flush().map_err(|e| io_error("flush file", e))?;
    Ok(())
}

/// Loads a snapshot from a `MessagePack` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<SessionSnapshot> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;

    from_bytes(&bytes)
}
