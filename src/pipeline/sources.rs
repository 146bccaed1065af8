use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::{
    config,
    error::{ProviderError, Result},
    info,
    management::HistoryStore,
    resilient::Session,
    spotify::TrackProvider,
    types::{ModuleSource, Page, SourceId, SourceKind, Track},
    utils, warning,
};

/// Page size for saved-track and playlist listings.
pub const PAGE_SIZE: u32 = 50;

/// Retries granted to a failing page after its first attempt.
pub const PAGE_RETRY_LIMIT: u32 = 2;

/// Tracks of one source plus the offsets of pages that could not be read.
#[derive(Debug, Default, Clone)]
pub struct Listing {
    pub tracks: Vec<Track>,
    pub dropped_offsets: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPage {
    pub source_id: SourceId,
    pub offset: u32,
}

/// Result of resolving a list of sources.
#[derive(Debug, Default, Clone)]
pub struct Aggregation {
    /// Tracks of every source, flattened in declaration order, duplicates kept.
    pub tracks: Vec<Track>,
    pub dropped_pages: Vec<DroppedPage>,
    /// Sources that contributed nothing because fetching them failed.
    pub failed_sources: Vec<SourceId>,
}

/// Resolves declared sources into tracks for one invocation.
pub struct SourceAggregator<'a> {
    provider: &'a dyn TrackProvider,
    session: &'a Session,
    history: &'a HistoryStore,
    now: DateTime<Utc>,
    retention_days: i64,
}

impl<'a> SourceAggregator<'a> {
    pub fn new(
        provider: &'a dyn TrackProvider,
        session: &'a Session,
        history: &'a HistoryStore,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            provider,
            session,
            history,
            now,
            retention_days: config::history_retention_days(),
        }
    }

    /// Sets how many days of listening history the local store keeps.
    pub fn with_retention_days(mut self, retention_days: i64) -> Self {
        self.retention_days = retention_days;
        self
    }

    /// Fetches all `sources` concurrently and concatenates their tracks.
    ///
    /// A source that fails contributes no tracks and does not affect the others. A
    /// source declared again with an identical kind is fetched once.
    pub async fn aggregate(&self, sources: &[ModuleSource]) -> Aggregation {
        let mut distinct: Vec<&ModuleSource> = Vec::with_capacity(sources.len());
        for source in sources {
            if distinct.iter().any(|d| d.kind == source.kind) {
                info!("Source {} repeats an earlier source, skipping", source.id);
                continue;
            }
            distinct.push(source);
        }

        let results = join_all(distinct.iter().map(|source| self.fetch(source))).await;

        let mut aggregation = Aggregation::default();
        for (source, result) in distinct.iter().zip(results) {
            match result {
                Ok(listing) => {
                    aggregation
                        .dropped_pages
                        .extend(listing.dropped_offsets.into_iter().map(|offset| DroppedPage {
                            source_id: source.id.clone(),
                            offset,
                        }));
                    aggregation.tracks.extend(listing.tracks);
                }
                Err(e) => {
                    warning!(
                        "Source {} unavailable, contributing no tracks: {}",
                        source.id,
                        e
                    );
                    aggregation.failed_sources.push(source.id.clone());
                }
            }
        }

        aggregation
    }

    /// Fetches a single source.
    pub async fn fetch(&self, source: &ModuleSource) -> Result<Listing> {
        match &source.kind {
            SourceKind::LikedTracks => {
                let listing = list_pages(&source.id, PAGE_SIZE, move |offset| {
                    self.session.call(move |token| async move {
                        self.provider.saved_tracks(&token, offset, PAGE_SIZE).await
                    })
                })
                .await?;
                Ok(listing)
            }
            SourceKind::Playlist { playlist_id } => {
                let playlist_id = playlist_id.as_str();
                let listing = list_pages(&source.id, PAGE_SIZE, move |offset| {
                    self.session.call(move |token| async move {
                        self.provider
                            .playlist_tracks(&token, playlist_id, offset, PAGE_SIZE)
                            .await
                    })
                })
                .await?;
                Ok(listing)
            }
            SourceKind::RecentlyListened { quantity, unit } => {
                let since = utils::days_before(self.now, i64::from(quantity.get()) * unit.days());
                if since < utils::days_before(self.now, self.retention_days) {
                    warning!(
                        "Source {} looks back further than the {} days of stored history",
                        source.id,
                        self.retention_days
                    );
                }
                let tracks = self
                    .history
                    .played_since(self.session.user_id(), since)
                    .await?;
                Ok(Listing {
                    tracks,
                    dropped_offsets: Vec::new(),
                })
            }
        }
    }
}

/// Walks an offset paginated listing page by page.
///
/// The first page must succeed, it tells how many items exist. Later pages that
/// still fail after [`PAGE_RETRY_LIMIT`] retries are skipped and their offsets
/// returned in [`Listing::dropped_offsets`]. Fatal credential errors abort.
pub async fn list_pages<F, Fut>(
    label: &str,
    page_size: u32,
    fetch_page: F,
) -> std::result::Result<Listing, ProviderError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = std::result::Result<Page, ProviderError>>,
{
    let first = fetch_with_retry(label, &fetch_page, 0).await?;
    let total = first.total;
    let mut has_next = first.next.is_some();
    let mut listing = Listing {
        tracks: first.items,
        dropped_offsets: Vec::new(),
    };

    let mut offset = first.offset + page_size;
    while has_next && offset < total {
        match fetch_with_retry(label, &fetch_page, offset).await {
            Ok(page) => {
                has_next = page.next.is_some();
                listing.tracks.extend(page.items);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warning!("Dropping page at offset {} of {}: {}", offset, label, e);
                listing.dropped_offsets.push(offset);
            }
        }
        offset += page_size;
    }

    Ok(listing)
}

async fn fetch_with_retry<F, Fut>(
    label: &str,
    fetch_page: &F,
    offset: u32,
) -> std::result::Result<Page, ProviderError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = std::result::Result<Page, ProviderError>>,
{
    let mut retries = 0;
    loop {
        match fetch_page(offset).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_fatal() || retries >= PAGE_RETRY_LIMIT => return Err(e),
            Err(e) => {
                retries += 1;
                warning!(
                    "Page at offset {} of {} failed ({}), retry {}/{}",
                    offset,
                    label,
                    e,
                    retries,
                    PAGE_RETRY_LIMIT
                );
            }
        }
    }
}
