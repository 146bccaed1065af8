//! JSON backed stores.
//!
//! Every manager owns one directory (or file) below a root directory and reads and
//! writes pretty printed JSON with `async-fs`, the same way for every concern.

mod auth;
mod history;
mod module;
mod run_log;
mod schedule;

use std::{io::ErrorKind, path::Path};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

pub use auth::{CredentialStore, is_expired};
pub use history::HistoryStore;
pub use module::ModuleStore;
pub use run_log::RunLog;
pub use schedule::ScheduleStore;

/// Reads `path` as JSON; `Ok(None)` when the file does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match async_fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(value)?;
    async_fs::write(path, json).await?;
    Ok(())
}

/// Ids become file names; anything that could escape the store directory is refused.
fn checked_id(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(Error::Validation(format!("invalid identifier {:?}", id)))
    }
}
