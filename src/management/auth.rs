use std::path::PathBuf;

use crate::{
    error::{Error, Result},
    management::{checked_id, read_json, write_json},
    types::Token,
};

/// Seconds before expiry at which a stored token is treated as expired already.
const EXPIRY_BUFFER_SECS: i64 = 240;

/// Per-user credential rows, one JSON file per user id.
///
/// The refresher overwrites a row after every refresh. Concurrent refreshes for the
/// same user race and the last writer wins, which the provider tolerates because old
/// and new tokens stay valid until the old one expires.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    root: PathBuf,
}

impl CredentialStore {
    pub fn new(root: PathBuf) -> Self {
        CredentialStore { root }
    }

    pub async fn load(&self, user_id: &str) -> Result<Token> {
        read_json(&self.token_path(user_id)?)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no stored credential for user {}", user_id)))
    }

    pub async fn persist(&self, user_id: &str, token: &Token) -> Result<()> {
        write_json(&self.token_path(user_id)?, token).await
    }

    fn token_path(&self, user_id: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        path.push(format!("credentials/{}.json", checked_id(user_id)?));
        Ok(path)
    }
}

/// True when `token` expires within the safety buffer as of `now` (unix seconds).
pub fn is_expired(token: &Token, now: i64) -> bool {
    now >= token.expires_at - EXPIRY_BUFFER_SECS
}
