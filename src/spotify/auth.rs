use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config,
    error::{self, ProviderError},
    management::CredentialStore,
    resilient::CredentialRefresher,
    types::Token,
};

/// Refreshes credentials at the Spotify token endpoint.
///
/// Reads the stored refresh token for the user, exchanges it with the
/// `refresh_token` grant and overwrites the stored row. Spotify may or may not
/// rotate the refresh token; when the response carries none the old one is kept.
#[derive(Debug, Clone)]
pub struct SpotifyRefresher {
    client: Client,
    token_url: String,
    client_id: String,
    store: CredentialStore,
}

impl SpotifyRefresher {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        store: CredentialStore,
    ) -> Self {
        Self {
            client: Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            store,
        }
    }

    pub fn from_env(store: CredentialStore) -> error::Result<Self> {
        Ok(Self::new(
            config::spotify_apitoken_url()?,
            config::spotify_client_id()?,
            store,
        ))
    }
}

#[async_trait]
impl CredentialRefresher for SpotifyRefresher {
    async fn refresh(&self, user_id: &str) -> Result<String, ProviderError> {
        let stored = self
            .store
            .load(user_id)
            .await
            .map_err(|e| ProviderError::Refresh(e.to_string()))?;

        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", stored.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Refresh(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Refresh(format!("{}: {}", status, body)));
        }

        let json: Value = res
            .json()
            .await
            .map_err(|e| ProviderError::Refresh(e.to_string()))?;

        let access_token = json["access_token"]
            .as_str()
            .ok_or_else(|| ProviderError::Refresh("response carries no access_token".into()))?
            .to_string();

        let token = Token {
            access_token: access_token.clone(),
            refresh_token: json["refresh_token"]
                .as_str()
                .map(str::to_string)
                .unwrap_or(stored.refresh_token),
            scope: json["scope"]
                .as_str()
                .map(str::to_string)
                .unwrap_or(stored.scope),
            expires_at: Utc::now().timestamp() + json["expires_in"].as_i64().unwrap_or(3600),
        };

        self.store
            .persist(user_id, &token)
            .await
            .map_err(|e| ProviderError::Refresh(e.to_string()))?;

        Ok(access_token)
    }
}
