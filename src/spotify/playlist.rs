use crate::{
    error::ProviderError,
    spotify::SpotifyClient,
    types::{AddTracksRequest, RemoveTracksRequest, TrackRef},
};

impl SpotifyClient {
    /// Adds up to 100 URIs to a playlist, at `position` when given, else at the end.
    pub(crate) async fn post_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
        position: Option<usize>,
    ) -> Result<(), ProviderError> {
        let api_url = format!(
            "{uri}/playlists/{id}/tracks",
            uri = &self.api_url,
            id = playlist_id
        );
        let body = AddTracksRequest {
            uris: uris.to_vec(),
            position,
        };

        self.send(self.client.post(&api_url).bearer_auth(token).json(&body))
            .await?;
        Ok(())
    }

    /// Removes every occurrence of up to 100 URIs from a playlist.
    pub(crate) async fn delete_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ProviderError> {
        let api_url = format!(
            "{uri}/playlists/{id}/tracks",
            uri = &self.api_url,
            id = playlist_id
        );
        let body = RemoveTracksRequest {
            tracks: uris
                .iter()
                .map(|uri| TrackRef { uri: uri.clone() })
                .collect(),
        };

        self.send(self.client.delete(&api_url).bearer_auth(token).json(&body))
            .await?;
        Ok(())
    }
}
