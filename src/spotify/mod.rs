//! # Spotify Integration Module
//!
//! The track provider the pipeline reads from and writes to. [`TrackProvider`] is
//! the capability the core depends on; [`SpotifyClient`] implements it against the
//! Spotify Web API.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline (sources, actions, sync writer)
//!          ↓
//! Resilient call wrapper (one refresh, one retry)
//!          ↓
//! TrackProvider
//!     ├── Listings (saved tracks, playlist tracks, recently played)
//!     └── Playlist mutations (add, remove)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Error Handling
//!
//! Every call reports an explicit [`ProviderError`]:
//! - **401** becomes [`ProviderError::Unauthorized`], which the wrapper recovers from
//!   by refreshing the credential once.
//! - **429** is honoured when `Retry-After` is at most 120 seconds: the client waits
//!   and sends the request once more. Longer waits surface as
//!   [`ProviderError::RateLimited`].
//! - Any other non-success status becomes [`ProviderError::Status`] with the body.
//!
//! ## API Coverage
//!
//! - `GET /me/tracks` - saved tracks, offset paginated
//! - `GET /playlists/{playlist_id}/tracks` - playlist items, offset paginated
//! - `GET /me/player/recently-played` - listening history, newest first
//! - `POST /playlists/{playlist_id}/tracks` - add up to 100 URIs, optionally at a position
//! - `DELETE /playlists/{playlist_id}/tracks` - remove up to 100 URIs
//!
//! ## Authentication
//!
//! [`auth::SpotifyRefresher`] exchanges the stored refresh token at the token
//! endpoint and overwrites the credential row with the result.

pub mod auth;
mod playlist;
mod tracks;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;

use crate::{
    config,
    error::{self, ProviderError},
    types::{Page, PlayedTrack},
    warning,
};

/// Longest `Retry-After` we are willing to sleep through.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Capability interface of the external track provider.
///
/// Every method takes the access token explicitly so the resilient wrapper can
/// retry with a refreshed one.
#[async_trait]
pub trait TrackProvider: Send + Sync {
    async fn saved_tracks(&self, token: &str, offset: u32, limit: u32)
        -> Result<Page, ProviderError>;

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page, ProviderError>;

    /// Plays after `after`, or the most recent ones when `after` is `None`.
    async fn recently_played(
        &self,
        token: &str,
        after: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<PlayedTrack>, ProviderError>;

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
        position: Option<usize>,
    ) -> Result<(), ProviderError>;

    async fn remove_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: Client,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> error::Result<Self> {
        Ok(Self::new(config::spotify_apiurl()?))
    }

    /// Sends `request`, waiting out a short rate limit once.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let retry = request.try_clone();
        let response = request.send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_secs(&response);
            if retry_after > MAX_RETRY_AFTER_SECS {
                warning!(
                    "Retry after has reached an abnormal high of {} seconds.",
                    retry_after
                );
                return Err(ProviderError::RateLimited(retry_after));
            }

            if let Some(retry) = retry {
                warning!("Rate limited, retrying in {} seconds", retry_after);
                sleep(Duration::from_secs(retry_after)).await;
                return check_status(retry.send().await?).await;
            }
            return Err(ProviderError::RateLimited(retry_after));
        }

        check_status(response).await
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ProviderError::Unauthorized);
    }
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TrackProvider for SpotifyClient {
    async fn saved_tracks(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page, ProviderError> {
        self.get_saved_tracks(token, offset, limit).await
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page, ProviderError> {
        self.get_playlist_tracks(token, playlist_id, offset, limit)
            .await
    }

    async fn recently_played(
        &self,
        token: &str,
        after: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<PlayedTrack>, ProviderError> {
        self.get_recently_played(token, after, limit).await
    }

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
        position: Option<usize>,
    ) -> Result<(), ProviderError> {
        self.post_tracks(token, playlist_id, uris, position).await
    }

    async fn remove_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ProviderError> {
        self.delete_tracks(token, playlist_id, uris).await
    }
}
