//! Configuration management for the playlist pipeline service.
//!
//! Values come from environment variables, optionally seeded from a `.env` file:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::error::{Error, Result};

const DEFAULT_HISTORY_RETENTION_DAYS: i64 = 90;

/// Loads environment variables from `sporlflow/.env` in the local data directory.
///
/// The directory is created when missing. A missing `.env` file is not an error;
/// every value can also be supplied through the process environment.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/sporlflow/.env`
/// - macOS: `~/Library/Application Support/sporlflow/.env`
/// - Windows: `%LOCALAPPDATA%/sporlflow/.env`
pub async fn load_env() -> Result<()> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlflow/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    }
    Ok(())
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::Config(format!("{} must be set", key)))
}

/// Address the HTTP server binds to, e.g. `127.0.0.1:8080`.
pub fn server_addr() -> Result<String> {
    required("SERVER_ADDRESS")
}

/// Spotify Web API base URL, e.g. `https://api.spotify.com/v1`.
pub fn spotify_apiurl() -> Result<String> {
    required("SPOTIFY_API_URL")
}

/// Token endpoint used for refreshing credentials,
/// e.g. `https://accounts.spotify.com/api/token`.
pub fn spotify_apitoken_url() -> Result<String> {
    required("SPOTIFY_API_TOKEN_URL")
}

pub fn spotify_client_id() -> Result<String> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Shared secret expected in the `Authorization: Bearer` header of invocations.
///
/// The timer facility is configured with the same secret so its callbacks pass.
pub fn invoke_secret() -> Result<String> {
    required("SPORLFLOW_INVOKE_SECRET")
}

/// Base URL of the external timer facility.
pub fn timer_url() -> Result<String> {
    required("SPORLFLOW_TIMER_URL")
}

/// URL the timer facility calls when a trigger fires, usually `<public url>/invoke`.
pub fn callback_url() -> Result<String> {
    required("SPORLFLOW_CALLBACK_URL")
}

/// Root directory of all persisted state.
pub fn data_dir() -> PathBuf {
    match env::var("SPORLFLOW_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push("sporlflow");
            path
        }
    }
}

/// How many days of listening history are kept locally.
pub fn history_retention_days() -> i64 {
    env::var("SPORLFLOW_HISTORY_RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|days: &i64| *days > 0)
        .unwrap_or(DEFAULT_HISTORY_RETENTION_DAYS)
}
