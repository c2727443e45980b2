use std::sync::Arc;

use feedback_lib::{AuthGate, SubmissionStore};

use super::config::FeedbackServerConfig;

/// Shared application state for the HTTP server.
pub struct AppState {
    /// Server configuration, fixed at startup.
    pub config: Arc<FeedbackServerConfig>,
    /// Submission storage backend selected by `server.storage`.
    pub store: Arc<dyn SubmissionStore>,
    /// Credential check for admin routes.
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(config: Arc<FeedbackServerConfig>, store: Arc<dyn SubmissionStore>) -> Self {
        let gate = AuthGate::new(config.admin.credentials());
        Self {
            config,
            store,
            gate,
        }
    }
}
