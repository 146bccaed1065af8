use futures::future::join_all;

use crate::{
    error::{Error, ProviderError, Result},
    pipeline::sources::list_pages,
    resilient::Session,
    spotify::TrackProvider,
    types::{Destination, SyncMode, Track},
    utils, warning,
};

/// Maximum number of URIs per playlist mutation.
pub const BATCH_SIZE: usize = 100;

const PLAYLIST_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Distinct URIs removed while clearing.
    pub removed: usize,
    pub inserted: usize,
    pub insert_batches: usize,
}

/// Writes the final track list into the destination playlist.
///
/// Batches are independent: each goes through the resilient wrapper on its own, so a
/// refresh triggered by one batch leaves batches already committed untouched. The
/// batches of a phase run concurrently; clearing finishes before insertion starts.
pub struct PlaylistWriter<'a> {
    provider: &'a dyn TrackProvider,
    session: &'a Session,
}

impl<'a> PlaylistWriter<'a> {
    pub fn new(provider: &'a dyn TrackProvider, session: &'a Session) -> Self {
        Self { provider, session }
    }

    pub async fn write(&self, destination: &Destination, tracks: &[Track]) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let append = destination.mode == SyncMode::Append;

        if !append {
            report.removed = self.clear(&destination.playlist_id).await?;
        }

        report.insert_batches = self.insert(&destination.playlist_id, tracks, append).await?;
        report.inserted = tracks.len();
        Ok(report)
    }

    /// Removes every track from `playlist_id`, returning the number of distinct URIs.
    ///
    /// The current content is listed strictly: a page that cannot be read would leave
    /// stale tracks behind, so it fails the clear.
    pub async fn clear(&self, playlist_id: &str) -> Result<usize> {
        let listing = list_pages(playlist_id, PLAYLIST_PAGE_SIZE, move |offset| {
            self.session.call(move |token| async move {
                self.provider
                    .playlist_tracks(&token, playlist_id, offset, PLAYLIST_PAGE_SIZE)
                    .await
            })
        })
        .await?;

        if !listing.dropped_offsets.is_empty() {
            return Err(ProviderError::IncompleteListing(listing.dropped_offsets).into());
        }

        // deleting by uri removes every occurrence, so each uri is sent once
        let uris = utils::unique_uris(&listing.tracks);
        let batches = uris.chunks(BATCH_SIZE).map(move |chunk| {
            self.session.call(move |token| async move {
                self.provider.remove_tracks(&token, playlist_id, chunk).await
            })
        });

        settle("remove", join_all(batches).await)?;
        Ok(uris.len())
    }

    /// Adds `tracks` in batches; when not appending each batch carries its explicit
    /// starting position `batch_index * BATCH_SIZE`.
    pub async fn insert(&self, playlist_id: &str, tracks: &[Track], append: bool) -> Result<usize> {
        let uris: Vec<String> = tracks.iter().map(|t| t.uri.clone()).collect();
        let positions = utils::chunk_positions(uris.len(), BATCH_SIZE, append);

        let batches = uris
            .chunks(BATCH_SIZE)
            .zip(positions)
            .map(move |(chunk, position)| {
                self.session.call(move |token| async move {
                    self.provider
                        .add_tracks(&token, playlist_id, chunk, position)
                        .await
                })
            });

        let results = join_all(batches).await;
        let count = results.len();
        settle("insert", results)?;
        Ok(count)
    }
}

/// Reports every failed batch and surfaces the first failure once all have settled.
fn settle(phase: &str, results: Vec<std::result::Result<(), ProviderError>>) -> Result<()> {
    let mut first_error: Option<Error> = None;
    for (index, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            warning!("{} batch {} failed: {}", phase, index, e);
            if first_error.is_none() {
                first_error = Some(e.into());
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
