use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SubmissionStore;
use crate::error::StoreError;
use crate::submission::{Fields, Submission};

/// In-memory submission storage backed by a `RwLock<Vec>`. Nothing survives a restart.
pub struct MemoryStore {
    data: RwLock<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, StoreError> {
        let data = self.data.read().await;
        Ok(data.clone())
    }

    async fn append(&self, fields: Fields) -> Result<Submission, StoreError> {
        let submission = Submission::new(fields);
        let mut data = self.data.write().await;
        data.push(submission.clone());
        Ok(submission)
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut data = self.data.write().await;
        let before = data.len();
        data.retain(|s| s.id != id);
        Ok(data.len() != before)
    }
}
