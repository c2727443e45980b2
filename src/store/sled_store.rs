use std::path::Path;

use async_trait::async_trait;

use super::SubmissionStore;
use crate::error::StoreError;
use crate::submission::{Fields, Submission};

const TREE_NAME: &str = "submissions";

/// Persistent submission storage backed by sled.
///
/// Each submission is its own record, keyed by a big-endian sled-generated id.
/// Those ids only grow, so key order is insertion order. Single-key inserts and
/// removals are atomic in sled, which is what keeps concurrent writers safe
/// here without an extra lock.
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    pub fn new(db: sled::Db) -> Result<Self, StoreError> {
        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| StoreError::Read(format!("failed to open sled tree: {}", e)))?;
        Ok(Self { db, tree })
    }

    /// Open a sled database at the given directory path.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(data_dir.as_ref())
            .map_err(|e| StoreError::Read(format!("failed to open sled db: {}", e)))?;
        Self::new(db)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.tree
            .flush()
            .map_err(|e| StoreError::Write(format!("failed to flush: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for SledStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        self.flush()
    }

    async fn list_all(&self) -> Result<Vec<Submission>, StoreError> {
        self.tree
            .iter()
            .values()
            .map(|item| {
                let value =
                    item.map_err(|e| StoreError::Read(format!("failed to read entry: {}", e)))?;
                serde_json::from_slice(&value)
                    .map_err(|e| StoreError::Read(format!("failed to parse entry: {}", e)))
            })
            .collect()
    }

    async fn append(&self, fields: Fields) -> Result<Submission, StoreError> {
        let submission = Submission::new(fields);
        let bytes = serde_json::to_vec(&submission)
            .map_err(|e| StoreError::Write(format!("failed to serialize submission: {}", e)))?;
        let key = self
            .db
            .generate_id()
            .map_err(|e| StoreError::Write(format!("failed to allocate key: {}", e)))?;

        self.tree
            .insert(key.to_be_bytes(), bytes)
            .map_err(|e| StoreError::Write(format!("failed to store submission: {}", e)))?;
        self.flush()?;

        Ok(submission)
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut found = None;
        for item in self.tree.iter() {
            let (key, value) =
                item.map_err(|e| StoreError::Read(format!("failed to read entry: {}", e)))?;
            let submission: Submission = serde_json::from_slice(&value)
                .map_err(|e| StoreError::Read(format!("failed to parse entry: {}", e)))?;
            if submission.id == id {
                found = Some(key);
                break;
            }
        }

        let Some(key) = found else {
            return Ok(false);
        };

        let removed = self
            .tree
            .remove(key)
            .map_err(|e| StoreError::Write(format!("failed to remove submission: {}", e)))?;
        self.flush()?;

        Ok(removed.is_some())
    }
}
