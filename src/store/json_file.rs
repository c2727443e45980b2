use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::SubmissionStore;
use crate::error::StoreError;
use crate::submission::{Fields, Submission};

/// Submission storage backed by a single pretty-printed JSON array on disk.
///
/// Every operation reads the whole file, and every mutation rewrites it. The
/// rewrite goes to a sibling `.tmp` file that is renamed over the original, so
/// readers never observe a half-written collection. All operations run under
/// one mutex per store, which keeps concurrent read-modify-write cycles from
/// overwriting each other.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("submissions.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_error(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Read(format!("{}: {}", self.path.display(), e))
    }

    fn write_error(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Write(format!("{}: {}", self.path.display(), e))
    }

    async fn read_collection(&self) -> Result<Vec<Submission>, StoreError> {
        let bytes = fs::read(&self.path).await.map_err(|e| self.read_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| self.read_error(e))
    }

    async fn write_collection(&self, submissions: &[Submission]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(submissions).map_err(|e| self.write_error(e))?;
        let tmp = self.temp_path();

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.write_error(e));
        }

        debug!(path = %self.path.display(), count = submissions.len(), "rewrote submissions");
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for JsonFileStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        // Any metadata failure means there is nothing usable yet; creation
        // below reports the real cause as a write error.
        if fs::metadata(&self.path).await.is_ok() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        self.write_collection(&[]).await?;
        info!(path = %self.path.display(), "created empty submissions file");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_collection().await
    }

    async fn append(&self, fields: Fields) -> Result<Submission, StoreError> {
        let _guard = self.lock.lock().await;
        let mut submissions = self.read_collection().await?;
        let submission = Submission::new(fields);
        submissions.push(submission.clone());
        self.write_collection(&submissions).await?;
        Ok(submission)
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut submissions = self.read_collection().await?;
        let before = submissions.len();
        submissions.retain(|s| s.id != id);
        if submissions.len() == before {
            return Ok(false);
        }
        self.write_collection(&submissions).await?;
        Ok(true)
    }
}
