//! JSON import/export of collection snapshots.
//! Provides functionality to save and load a [`Snapshot`] to/from JSON files.

use crate::error::StoreError;
use crate::models::Snapshot;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::info;

/// Exports a snapshot to a pretty-printed JSON file at the specified path.
/// Returns an error if file creation or writing fails.
pub fn export_json_to_path(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let json_string = serde_json::to_string_pretty(snapshot)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;

    info!(
        path = %path.display(),
        cards = snapshot.cards.len(),
        sessions = snapshot.sessions.len(),
        "snapshot exported"
    );
    Ok(())
}

/// Imports a snapshot from a JSON file.
/// Returns an error if the file doesn't exist, contains invalid JSON,
/// or describes an unreachable card/session state.
pub fn import_json(path: impl AsRef<Path>) -> Result<Snapshot, StoreError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
    snapshot.validate()?;

    info!(
        path = %path.display(),
        cards = snapshot.cards.len(),
        sessions = snapshot.sessions.len(),
        "snapshot imported"
    );
    Ok(snapshot)
}
