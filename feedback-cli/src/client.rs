use std::process;

use chrono::{DateTime, Local};
use feedback_lib::auth::DEFAULT_USERNAME;
use feedback_lib::{Credentials, Submission};
use serde::Deserialize;

/// Configuration for remote admin operations (from feedback.toml [remote] section)
#[derive(Debug, Deserialize, Default)]
pub struct RemoteConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Connection flags shared by `list` and `delete`.
#[derive(Debug, Default)]
pub struct RemoteArgs {
    pub remote: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub config_path: String,
}

/// Load remote config from feedback.toml
pub fn load_remote_config(config_path: &str) -> RemoteConfig {
    std::fs::read_to_string(config_path)
        .ok()
        .and_then(|content| {
            #[derive(Deserialize)]
            struct FeedbackToml {
                remote: Option<RemoteConfig>,
            }
            toml::from_str::<FeedbackToml>(&content).ok()
        })
        .and_then(|c| c.remote)
        .unwrap_or_default()
}

/// Resolve admin credentials from: CLI arg > env var > feedback.toml config.
/// The username falls back to the default admin name; the password has no fallback.
fn resolve_credentials(
    args: &RemoteArgs,
    config: &RemoteConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<Credentials> {
    let username = args
        .username
        .clone()
        .or_else(|| lookup("ADMIN_USERNAME"))
        .or_else(|| config.username.clone())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
    let password = args
        .password
        .clone()
        .or_else(|| lookup("ADMIN_PASSWORD"))
        .or_else(|| config.password.clone())?;
    Some(Credentials::new(username, password))
}

/// Resolve the remote URL from: CLI arg > feedback.toml config
fn resolve_remote_url(args: &RemoteArgs, config: &RemoteConfig) -> Option<String> {
    args.remote.clone().or_else(|| config.url.clone())
}

fn submissions_url(remote: &str) -> String {
    format!("{}/api/submissions", remote.trim_end_matches('/'))
}

/// URL of a single submission, with the id percent-encoded as one path segment.
fn submission_url(remote: &str, id: &str) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(&submissions_url(remote))
        .map_err(|e| format!("Invalid remote URL {}: {}", remote, e))?;
    url.path_segments_mut()
        .map_err(|_| format!("Invalid remote URL {}: cannot hold a path", remote))?
        .push(id);
    Ok(url)
}

/// Render a stored RFC 3339 timestamp in local time, or as-is if it doesn't parse.
fn display_timestamp(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Resolve URL and credentials or exit with a hint about where to set them.
fn connection(args: &RemoteArgs) -> (String, Credentials) {
    let config = load_remote_config(&args.config_path);

    let remote = match resolve_remote_url(args, &config) {
        Some(url) => url,
        None => {
            eprintln!("No remote URL specified. Use --remote or configure [remote] in feedback.toml");
            process::exit(1);
        }
    };

    let credentials = match resolve_credentials(args, &config, |key| std::env::var(key).ok()) {
        Some(c) => c,
        None => {
            eprintln!("No admin password specified. Use --password, set ADMIN_PASSWORD, or configure [remote] in feedback.toml");
            process::exit(1);
        }
    };

    (remote, credentials)
}

pub async fn run_list(args: RemoteArgs, as_json: bool) {
    let (remote, credentials) = connection(&args);

    let client = reqwest::Client::new();
    let response = match client
        .get(submissions_url(&remote))
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to fetch submissions: {}", e);
            process::exit(1);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        eprintln!("List failed ({}): {}", status, body);
        process::exit(1);
    }

    #[derive(Deserialize)]
    struct ListResponse {
        count: usize,
        submissions: Vec<Submission>,
    }

    let listing = match response.json::<ListResponse>().await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to parse response: {}", e);
            process::exit(1);
        }
    };

    if as_json {
        match serde_json::to_string_pretty(&listing.submissions) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Failed to render submissions: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    for sub in &listing.submissions {
        println!(
            "{}  {}  {}",
            sub.id,
            display_timestamp(&sub.timestamp),
            sub.field_str("fullName").unwrap_or("Unknown")
        );
    }
    println!("{} submission(s)", listing.count);
}

pub async fn run_delete(id: &str, args: RemoteArgs) {
    let (remote, credentials) = connection(&args);

    let url = match submission_url(&remote, id) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let client = reqwest::Client::new();
    let response = match client
        .delete(url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to delete: {}", e);
            process::exit(1);
        }
    };

    match response.status() {
        s if s.is_success() => println!("✓ Deleted {}", id),
        reqwest::StatusCode::NOT_FOUND => {
            eprintln!("Submission {} not found", id);
            process::exit(1);
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            eprintln!("Delete failed ({}): {}", status, body);
            process::exit(1);
        }
    }
}
