//! Single-file JSON storage.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so a crash mid-write never leaves a truncated file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ensure_dir, DbError, Repository};
use crate::state::Snapshot;

pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Repository for JsonFileRepository {
    fn load(&self) -> Result<Snapshot, DbError> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Snapshot::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), DbError> {
        write_atomic(&self.path, snapshot)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn backup_to(&self, dest: &Path) -> Result<(), DbError> {
        if !self.path.exists() {
            return write_atomic(dest, &Snapshot::default());
        }
        std::fs::copy(&self.path, dest)?;
        Ok(())
    }
}

/// Serialize `snapshot` as pretty JSON and atomically replace `path`.
pub(crate) fn write_atomic(path: &Path, snapshot: &Snapshot) -> Result<(), DbError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, snapshot)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DbError::Io(e.error))?;
    Ok(())
}
