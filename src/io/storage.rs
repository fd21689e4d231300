use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::model::{ListKind, Task, TaskStore};

/// Error type for snapshot I/O.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The persisted shape: just the three collections.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    pending: Vec<Task>,
    completed: Vec<Task>,
    trash: Vec<Task>,
}

/// Load a store from the snapshot file. A missing file is an empty store.
pub fn load(path: &Path) -> Result<TaskStore, StorageError> {
    if !path.exists() {
        return Ok(TaskStore::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| StorageError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let snapshot: Snapshot = serde_json::from_str(&text).map_err(|e| StorageError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(TaskStore::from_lists(
        snapshot.pending,
        snapshot.completed,
        snapshot.trash,
    ))
}

/// Write the store to the snapshot file, atomically.
pub fn save(path: &Path, store: &TaskStore) -> Result<(), StorageError> {
    let snapshot = Snapshot {
        pending: store.list(ListKind::Pending).to_vec(),
        completed: store.list(ListKind::Completed).to_vec(),
        trash: store.list(ListKind::Trash).to_vec(),
    };
    let text = serde_json::to_string_pretty(&snapshot)?;
    atomic_write(path, text.as_bytes()).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write via a temp file in the same directory, then rename into place.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
