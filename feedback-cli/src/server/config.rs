use std::env;

use feedback_lib::auth::{DEFAULT_PASSWORD, DEFAULT_USERNAME};
use feedback_lib::Credentials;
use serde::Deserialize;
use tracing::warn;

/// Top-level feedback.toml configuration.
///
/// Built once at startup (file, then environment, then CLI flags) and shared
/// read-only afterwards.
#[derive(Debug, Deserialize, Default)]
pub struct FeedbackServerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,
    /// Backing file for the `json` backend.
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Database directory for the `sled` backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    #[serde(default = "default_form_page")]
    pub form_page: String,
    #[serde(default = "default_admin_page")]
    pub admin_page: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Sled,
    Memory,
}

#[derive(Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

impl AdminConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

// ── Default value functions ──────────────────────────

fn default_port() -> u16 {
    3000
}

fn default_hostname() -> String {
    "0.0.0.0".to_string()
}

fn default_storage() -> StorageBackend {
    StorageBackend::Json
}

fn default_data_file() -> String {
    "submissions.json".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_form_page() -> String {
    "interactive_feedback_form.html".to_string()
}

fn default_admin_page() -> String {
    "admin.html".to_string()
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            hostname: default_hostname(),
            storage: default_storage(),
            data_file: default_data_file(),
            data_dir: default_data_dir(),
            public_dir: default_public_dir(),
            form_page: default_form_page(),
            admin_page: default_admin_page(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl FeedbackServerConfig {
    /// Load configuration from a TOML file, falling back to defaults if the file
    /// doesn't exist or cannot be parsed.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(_) => Self::default(),
        }
    }

    fn parse(path: &str, content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to parse {}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // PORT
        if let Some(val) = lookup("PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("ignoring invalid PORT value: {}", val),
            }
        }

        // HOST
        if let Some(val) = lookup("HOST") {
            self.server.hostname = val;
        }

        // FEEDBACK_STORAGE
        if let Some(val) = lookup("FEEDBACK_STORAGE") {
            match val.to_lowercase().as_str() {
                "json" => self.server.storage = StorageBackend::Json,
                "sled" => self.server.storage = StorageBackend::Sled,
                "memory" => self.server.storage = StorageBackend::Memory,
                other => warn!("unknown FEEDBACK_STORAGE value: {}", other),
            }
        }

        // FEEDBACK_DATA_FILE
        if let Some(val) = lookup("FEEDBACK_DATA_FILE") {
            self.server.data_file = val;
        }

        // FEEDBACK_PUBLIC_DIR
        if let Some(val) = lookup("FEEDBACK_PUBLIC_DIR") {
            self.server.public_dir = val;
        }

        // ADMIN_USERNAME / ADMIN_PASSWORD
        if let Some(val) = lookup("ADMIN_USERNAME") {
            self.admin.username = val;
        }
        if let Some(val) = lookup("ADMIN_PASSWORD") {
            self.admin.password = val;
        }
    }
}
