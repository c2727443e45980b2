pub mod json_file;
pub mod memory;
pub mod sled_store;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::submission::{Fields, Submission};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Storage for the submission collection. Implementations must be thread-safe
/// and must not lose updates when `append`/`remove` run concurrently.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Create an empty collection if none exists yet. Never touches existing data.
    async fn ensure_initialized(&self) -> Result<(), StoreError>;

    /// All submissions, oldest first.
    async fn list_all(&self) -> Result<Vec<Submission>, StoreError>;

    /// Stamp `fields` with a new id and timestamp and persist the result.
    /// The returned submission is committed only if this returns `Ok`.
    async fn append(&self, fields: Fields) -> Result<Submission, StoreError>;

    /// Remove the submission with the given id. Returns `false` if no entry matched.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}
