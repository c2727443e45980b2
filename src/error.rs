use thiserror::Error;

/// Failures surfaced by a [`SubmissionStore`](crate::store::SubmissionStore).
///
/// The message carries the underlying detail for logs; the HTTP layer never
/// forwards it to clients.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read submissions: {0}")]
    Read(String),

    #[error("failed to write submissions: {0}")]
    Write(String),
}
