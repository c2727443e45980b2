mod auth;
pub mod config;
mod error;
mod metrics;
mod routes;
mod state;

use std::path::Path;
use std::process;
use std::sync::Arc;

use axum::routing::{delete, get, get_service, post};
use axum::{middleware, Router};
use feedback_lib::{JsonFileStore, MemoryStore, SledStore, StoreError, SubmissionStore};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};

use self::auth::require_admin;
use self::config::{FeedbackServerConfig, ServerConfig, StorageBackend};
use self::metrics::{handle_metrics, track_metrics};
use self::routes::{handle_delete, handle_health, handle_list, handle_submit};
use self::state::AppState;

/// CLI flags for `feedback serve`. Each one, when set, wins over the config
/// file and the environment.
#[derive(Debug, Default)]
pub struct ServeArgs {
    pub config_path: String,
    pub port: Option<u16>,
    pub hostname: Option<String>,
    pub storage: Option<StorageBackend>,
    pub data_file: Option<String>,
    pub public_dir: Option<String>,
}

impl ServeArgs {
    fn apply_to(self, config: &mut FeedbackServerConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(hostname) = self.hostname {
            config.server.hostname = hostname;
        }
        if let Some(storage) = self.storage {
            config.server.storage = storage;
        }
        if let Some(data_file) = self.data_file {
            config.server.data_file = data_file;
        }
        if let Some(public_dir) = self.public_dir {
            config.server.public_dir = public_dir;
        }
    }
}

/// Open the storage backend named by the configuration.
pub fn open_store(server: &ServerConfig) -> Result<Arc<dyn SubmissionStore>, StoreError> {
    let store: Arc<dyn SubmissionStore> = match server.storage {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&server.data_file)),
        StorageBackend::Sled => Arc::new(SledStore::open(&server.data_dir)?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Build the full router: public submission endpoint and pages, plus the
/// admin API guarded by the auth gate.
pub fn build_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let public_dir = Path::new(&server.public_dir);

    let admin = Router::new()
        .route("/admin", get_service(ServeFile::new(&server.admin_page)))
        .route("/api/submissions", get(handle_list))
        .route("/api/submissions/{id}", delete(handle_delete))
        .route("/metrics", get(handle_metrics))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_admin,
        ));

    Router::new()
        .route("/", get_service(ServeFile::new(&server.form_page)))
        .route("/health", get(handle_health))
        .route("/api/submit-feedback", post(handle_submit))
        .merge(admin)
        .fallback_service(ServeDir::new(public_dir))
        .layer(middleware::from_fn(track_metrics))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}

pub async fn run_serve(args: ServeArgs) {
    let mut config = FeedbackServerConfig::load(&args.config_path);
    config.apply_env_overrides();
    args.apply_to(&mut config);
    let config = Arc::new(config);

    let store = match open_store(&config.server) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open storage: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = store.ensure_initialized().await {
        error!("Failed to initialize storage: {}", e);
        process::exit(1);
    }

    let state = Arc::new(AppState::new(Arc::clone(&config), store));

    if state.gate.uses_default_password() {
        warn!("WARNING: Using default admin password!");
        warn!("Set ADMIN_PASSWORD environment variable before deploying!");
    }

    let app = build_router(Arc::clone(&state));

    let addr = format!("{}:{}", config.server.hostname, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", addr, e);
            process::exit(1);
        });

    let base = format!("http://localhost:{}", config.server.port);
    info!("Server running on http://{} (storage: {:?})", addr, config.server.storage);
    info!("Feedback form: {}/", base);
    info!("Admin panel: {}/admin", base);
    info!(
        "Admin credentials: {} / {}",
        state.gate.username(),
        if state.gate.uses_default_password() {
            "DEFAULT - CHANGE THIS!"
        } else {
            "***"
        }
    );

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!("failed to install SIGTERM handler: {}", e);
                    process::exit(1);
                }
            };

        #[cfg(unix)]
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }

        #[cfg(not(unix))]
        ctrl_c.await.ok();

        info!("Shutdown signal received, finishing in-flight requests...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .unwrap_or_else(|e| {
            error!("Server error: {}", e);
            process::exit(1);
        });

    info!("Server stopped");
}

#[cfg(test)]
mod tests {
    use reqwest::header::WWW_AUTHENTICATE;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::config::AdminConfig;
    use super::*;

    struct TestServer {
        base: String,
        client: reqwest::Client,
        _dir: TempDir,
        data_file: std::path::PathBuf,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn list(&self) -> reqwest::Response {
            self.client
                .get(self.url("/api/submissions"))
                .basic_auth("admin", Some("secret"))
                .send()
                .await
                .unwrap()
        }

        async fn submit(&self, body: Value) -> Value {
            let resp = self
                .client
                .post(self.url("/api/submit-feedback"))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            resp.json().await.unwrap()
        }
    }

    async fn spawn_server() -> TestServer {
        let dir = TempDir::new().unwrap();
        let data_file = dir.path().join("submissions.json");
        let public_dir = dir.path().join("public");
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::write(public_dir.join("style.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("form.html"), "<form></form>").unwrap();
        std::fs::write(dir.path().join("admin.html"), "<h1>admin</h1>").unwrap();

        let mut config = FeedbackServerConfig::default();
        config.server.data_file = data_file.to_string_lossy().into_owned();
        config.server.public_dir = public_dir.to_string_lossy().into_owned();
        config.server.form_page = dir.path().join("form.html").to_string_lossy().into_owned();
        config.server.admin_page = dir.path().join("admin.html").to_string_lossy().into_owned();
        config.admin = AdminConfig {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };

        let store = open_store(&config.server).unwrap();
        store.ensure_initialized().await.unwrap();
        let state = Arc::new(AppState::new(Arc::new(config), store));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            _dir: dir,
            data_file,
        }
    }

    #[tokio::test]
    async fn test_submit_then_list() {
        let server = spawn_server().await;

        let body = server.submit(json!({"fullName": "Ada", "rating": 5})).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("Feedback submitted successfully"));
        let id = body["id"].as_str().unwrap().to_string();

        let resp = server.list().await;
        assert_eq!(resp.status(), StatusCode::OK);
        let listed: Value = resp.json().await.unwrap();
        assert_eq!(listed["success"], json!(true));
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["submissions"][0]["id"], json!(id));
        assert_eq!(listed["submissions"][0]["fullName"], json!("Ada"));
        assert_eq!(listed["submissions"][0]["rating"], json!(5));
        assert!(listed["submissions"][0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_submit_form_encoded() {
        let server = spawn_server().await;
        let resp = server
            .client
            .post(server.url("/api/submit-feedback"))
            .form(&[("fullName", "Grace"), ("comments", "Great talk")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let listed: Value = server.list().await.json().await.unwrap();
        assert_eq!(listed["submissions"][0]["fullName"], json!("Grace"));
        assert_eq!(listed["submissions"][0]["comments"], json!("Great talk"));
    }

    #[tokio::test]
    async fn test_submit_rejects_non_object() {
        let server = spawn_server().await;
        let resp = server
            .client
            .post(server.url("/api/submit-feedback"))
            .json(&json!(["not", "an", "object"]))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_admin_routes_require_credentials() {
        let server = spawn_server().await;

        for path in ["/api/submissions", "/admin", "/metrics"] {
            let resp = server.client.get(server.url(path)).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
            assert_eq!(
                resp.headers().get(WWW_AUTHENTICATE).unwrap(),
                "Basic realm=\"Admin Area\""
            );
        }

        let resp = server
            .client
            .get(server.url("/api/submissions"))
            .basic_auth("admin", Some("wrong"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(WWW_AUTHENTICATE));

        let resp = server
            .client
            .delete(server.url("/api/submissions/anything"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_page_served_with_credentials() {
        let server = spawn_server().await;
        let resp = server
            .client
            .get(server.url("/admin"))
            .basic_auth("admin", Some("secret"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "<h1>admin</h1>");
    }

    #[tokio::test]
    async fn test_public_pages_open() {
        let server = spawn_server().await;

        let resp = server.client.get(server.url("/")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "<form></form>");

        let resp = server.client.get(server.url("/style.css")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = server.client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], json!("ok"));
    }

    #[tokio::test]
    async fn test_admin_page_not_reachable_through_static_files() {
        let server = spawn_server().await;

        let resp = server.client.get(server.url("/admin.html")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = server.client.get(server.url("/admin")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_then_not_found() {
        let server = spawn_server().await;
        let ada = server.submit(json!({"fullName": "Ada"})).await;
        server.submit(json!({"fullName": "Grace"})).await;
        let ada_id = ada["id"].as_str().unwrap();

        let resp = server
            .client
            .delete(server.url(&format!("/api/submissions/{}", ada_id)))
            .basic_auth("admin", Some("secret"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"success": true, "message": "Submission deleted"}));

        let listed: Value = server.list().await.json().await.unwrap();
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["submissions"][0]["fullName"], json!("Grace"));

        let resp = server
            .client
            .delete(server.url(&format!("/api/submissions/{}", ada_id)))
            .basic_auth("admin", Some("secret"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"success": false, "message": "Submission not found"}));

        let listed: Value = server.list().await.json().await.unwrap();
        assert_eq!(listed["count"], json!(1));
    }

    #[tokio::test]
    async fn test_corrupt_store_returns_generic_error() {
        let server = spawn_server().await;
        std::fs::write(&server.data_file, "{ definitely not an array").unwrap();

        let resp = server.list().await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Error fetching submissions"})
        );

        let resp = server
            .client
            .post(server.url("/api/submit-feedback"))
            .json(&json!({"fullName": "Ada"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Error submitting feedback"})
        );

        // The server keeps serving after store failures.
        let resp = server.client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_all_persisted() {
        let server = Arc::new(spawn_server().await);

        let tasks: Vec<_> = (0..25)
            .map(|i| {
                let server = Arc::clone(&server);
                tokio::spawn(async move { server.submit(json!({"n": i})).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let listed: Value = server.list().await.json().await.unwrap();
        assert_eq!(listed["count"], json!(25));
    }
}
