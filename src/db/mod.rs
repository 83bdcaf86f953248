//! Persistence for the pipeline snapshot.
//!
//! Storage is whole-snapshot: `load` returns every collection, `save`
//! replaces every collection atomically. Three backends:
//!
//! - `SqliteRepository`: `~/.leadbook/leadbook.db`, WAL mode, numbered
//!   migrations. The default.
//! - `JsonFileRepository`: a single `leadbook.json`, written via
//!   temp-file-and-rename.
//! - `MemoryRepository`: nothing leaves the process. Used by tests and
//!   `--storage memory`.

use std::path::{Path, PathBuf};

use crate::state::Snapshot;
use crate::types::{Config, StorageBackend};

pub mod json;
pub mod memory;
pub mod sqlite;
pub mod types;

pub use json::JsonFileRepository;
pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;
pub use types::*;

/// Load/save boundary between the store and a backend.
///
/// `save` must be all-or-nothing: on `Err` the previously saved snapshot is
/// still what `load` returns.
pub trait Repository: Send + Sync {
    fn load(&self) -> Result<Snapshot, DbError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), DbError>;

    /// Short human-readable location, for logs.
    fn describe(&self) -> String;

    /// Copy the current data to `dest`. Backends without a native format
    /// write a JSON export.
    fn backup_to(&self, dest: &Path) -> Result<(), DbError> {
        let snapshot = self.load()?;
        json::write_atomic(dest, &snapshot)
    }
}

/// Resolve the data directory: config override, else `~/.leadbook`.
pub fn data_dir(config: &Config) -> Result<PathBuf, DbError> {
    if let Some(dir) = config.data_dir.as_deref().filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
    Ok(home.join(".leadbook"))
}

/// Open the backend selected in `config`.
pub fn open_repository(config: &Config) -> Result<Box<dyn Repository>, DbError> {
    let repo: Box<dyn Repository> = match config.storage {
        StorageBackend::Sqlite => {
            Box::new(SqliteRepository::open_at(data_dir(config)?.join("leadbook.db"))?)
        }
        StorageBackend::Json => {
            Box::new(JsonFileRepository::new(data_dir(config)?.join("leadbook.json")))
        }
        StorageBackend::Memory => Box::new(MemoryRepository::default()),
    };
    log::info!("Using {} storage at {}", config.storage, repo.describe());
    Ok(repo)
}

/// Create `dir` (and parents) if missing.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), DbError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(DbError::CreateDir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_repository_per_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        for storage in [StorageBackend::Sqlite, StorageBackend::Json, StorageBackend::Memory] {
            let config = Config {
                data_dir: Some(dir.path().to_string_lossy().to_string()),
                storage,
                ..Default::default()
            };
            let repo = open_repository(&config).expect("open");
            let empty = repo.load().expect("load");
            assert!(empty.clients.is_empty());
        }
        assert!(dir.path().join("leadbook.db").exists());
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            data_dir: Some("/tmp/leadbook-test".into()),
            ..Default::default()
        };
        assert_eq!(data_dir(&config).unwrap(), PathBuf::from("/tmp/leadbook-test"));
    }
}
