use parking_lot::Mutex;

use super::{DbError, Repository};
use crate::state::Snapshot;

/// Process-local storage.
#[derive(Default)]
pub struct MemoryRepository {
    saved: Mutex<Snapshot>,
}

impl MemoryRepository {
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            saved: Mutex::new(snapshot),
        }
    }
}

impl Repository for MemoryRepository {
    fn load(&self) -> Result<Snapshot, DbError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), DbError> {
        *self.saved.lock() = snapshot.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
