//! Single refresh-and-retry wrapper shared by every provider call.
//!
//! A call that fails with [`ProviderError::Unauthorized`] triggers exactly one
//! credential refresh and one retry with the fresh token. A second auth failure is
//! fatal ([`ProviderError::CredentialRejected`]). There is no backoff and no further
//! retry at this layer.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    error::{ProviderError, Result},
    info,
    management::{CredentialStore, is_expired},
    warning,
};

/// Exchanges an expired credential for a fresh access token and persists it.
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    async fn refresh(&self, user_id: &str) -> std::result::Result<String, ProviderError>;
}

/// Runs `call` with `token`; on an auth failure refreshes once and retries once.
pub async fn attempt<T, C, CFut, R, RFut>(
    token: String,
    call: C,
    refresh: R,
) -> std::result::Result<T, ProviderError>
where
    C: Fn(String) -> CFut,
    CFut: Future<Output = std::result::Result<T, ProviderError>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = std::result::Result<String, ProviderError>>,
{
    match call(token).await {
        Err(e) if e.is_auth_failure() => {
            warning!("Access token rejected, refreshing credential");
            let fresh = refresh().await?;
            match call(fresh).await {
                Err(e) if e.is_auth_failure() => Err(ProviderError::CredentialRejected),
                other => other,
            }
        }
        other => other,
    }
}

/// A user's credential for the duration of one invocation.
///
/// Concurrent calls share the held token; a refresh made by one of them is visible
/// to every call that starts afterwards. Calls already in flight keep their token
/// and recover through their own refresh if it was rejected.
pub struct Session {
    user_id: String,
    token: Mutex<String>,
    refresher: Arc<dyn CredentialRefresher>,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        refresher: Arc<dyn CredentialRefresher>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            token: Mutex::new(access_token.into()),
            refresher,
        }
    }

    /// Opens a session from the stored credential, refreshing it first when it is
    /// about to expire.
    pub async fn open(
        user_id: &str,
        store: &CredentialStore,
        refresher: Arc<dyn CredentialRefresher>,
    ) -> Result<Self> {
        let stored = store.load(user_id).await?;
        let access_token = if is_expired(&stored, Utc::now().timestamp()) {
            info!("Stored credential for {} is expiring, refreshing", user_id);
            refresher.refresh(user_id).await?
        } else {
            stored.access_token
        };

        Ok(Self::new(user_id, access_token, refresher))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Runs `call` through [`attempt`] with the session's current token.
    pub async fn call<T, C, CFut>(&self, call: C) -> std::result::Result<T, ProviderError>
    where
        C: Fn(String) -> CFut,
        CFut: Future<Output = std::result::Result<T, ProviderError>>,
    {
        let token = self.token.lock().await.clone();
        attempt(token, call, || async {
            let fresh = self.refresher.refresh(&self.user_id).await?;
            *self.token.lock().await = fresh.clone();
            Ok(fresh)
        })
        .await
    }
}
