use chrono::{DateTime, Utc};

use crate::{
    error::ProviderError,
    spotify::SpotifyClient,
    types::{Page, PagingResponse, PlayedTrack, RecentlyPlayedResponse},
};

impl SpotifyClient {
    /// One page of the user's saved tracks (`GET /me/tracks`).
    pub(crate) async fn get_saved_tracks(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page, ProviderError> {
        let api_url = format!(
            "{uri}/me/tracks?limit={limit}&offset={offset}",
            uri = &self.api_url,
            limit = limit,
            offset = offset
        );
        self.get_page(token, &api_url).await
    }

    /// One page of a playlist's items (`GET /playlists/{id}/tracks`).
    pub(crate) async fn get_playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page, ProviderError> {
        let api_url = format!(
            "{uri}/playlists/{id}/tracks?limit={limit}&offset={offset}",
            uri = &self.api_url,
            id = playlist_id,
            limit = limit,
            offset = offset
        );
        self.get_page(token, &api_url).await
    }

    /// Recently played tracks after `after` (`GET /me/player/recently-played`).
    ///
    /// The endpoint takes the cursor as unix milliseconds and returns at most 50
    /// plays, newest first.
    pub(crate) async fn get_recently_played(
        &self,
        token: &str,
        after: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<PlayedTrack>, ProviderError> {
        let mut api_url = format!(
            "{uri}/me/player/recently-played?limit={limit}",
            uri = &self.api_url,
            limit = limit.min(50)
        );
        if let Some(after) = after {
            api_url.push_str(&format!("&after={}", after.timestamp_millis()));
        }

        let response = self
            .send(self.client.get(&api_url).bearer_auth(token))
            .await?;
        let json = response.json::<RecentlyPlayedResponse>().await?;

        Ok(json
            .items
            .into_iter()
            .filter_map(|item| {
                let played_at = item.played_at;
                item.track
                    .into_track()
                    .map(|track| PlayedTrack { track, played_at })
            })
            .collect())
    }

    async fn get_page(&self, token: &str, api_url: &str) -> Result<Page, ProviderError> {
        let response = self
            .send(self.client.get(api_url).bearer_auth(token))
            .await?;
        let json = response.json::<PagingResponse>().await?;

        Ok(Page {
            items: json
                .items
                .into_iter()
                .filter_map(|item| item.track.and_then(|t| t.into_track()))
                .collect(),
            next: json.next,
            offset: json.offset,
            total: json.total,
        })
    }
}
