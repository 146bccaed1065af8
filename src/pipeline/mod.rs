//! # Pipeline Module
//!
//! One invocation of a module: resolve the declared sources, fold the actions over
//! the aggregated tracks and write the result into the destination playlist.
//!
//! ## Flow
//!
//! ```text
//! Module
//!   ↓
//! SourceAggregator   (concurrent fetch per source, page retries)
//!   ↓
//! apply_actions      (strict left fold: Shuffle, Filter)
//!   ↓
//! PlaylistWriter     (replace or append, batches of 100)
//! ```
//!
//! Every provider call goes through [`Session::call`], so an expired credential is
//! refreshed once and the call retried once.

mod actions;
mod sources;
mod sync;

use std::sync::Arc;

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config,
    error::Result,
    info,
    management::{CredentialStore, HistoryStore},
    resilient::{CredentialRefresher, Session},
    spotify::{SpotifyClient, TrackProvider, auth::SpotifyRefresher},
    types::{Module, Track},
    utils,
};

pub use actions::{apply_actions, exclude, shuffle};
pub use sources::{
    Aggregation, DroppedPage, Listing, PAGE_RETRY_LIMIT, PAGE_SIZE, SourceAggregator, list_pages,
};
pub use sync::{BATCH_SIZE, PlaylistWriter, SyncReport};

/// Most plays the recently-played endpoint returns per request.
const HISTORY_BATCH: u32 = 50;

/// Result of one successful module run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final track list as written to the destination.
    pub tracks: Vec<Track>,
    pub dropped_pages: Vec<DroppedPage>,
    pub failed_sources: Vec<String>,
    pub sync: SyncReport,
}

/// Executes modules against a track provider.
pub struct Runner {
    provider: Arc<dyn TrackProvider>,
    refresher: Arc<dyn CredentialRefresher>,
    credentials: CredentialStore,
    history: HistoryStore,
}

impl Runner {
    pub fn new(
        provider: Arc<dyn TrackProvider>,
        refresher: Arc<dyn CredentialRefresher>,
        credentials: CredentialStore,
        history: HistoryStore,
    ) -> Self {
        Self {
            provider,
            refresher,
            credentials,
            history,
        }
    }

    /// Spotify backed runner with its stores below [`config::data_dir`].
    pub fn from_env() -> Result<Self> {
        let data_dir = config::data_dir();
        let credentials = CredentialStore::new(data_dir.clone());

        Ok(Self::new(
            Arc::new(SpotifyClient::from_env()?),
            Arc::new(SpotifyRefresher::from_env(credentials.clone())?),
            credentials,
            HistoryStore::new(data_dir),
        ))
    }

    pub async fn run(&self, module: &Module) -> Result<RunOutcome> {
        module.validate()?;

        let session = Session::open(&module.user_id, &self.credentials, self.refresher.clone())
            .await?;
        let aggregator = SourceAggregator::new(
            self.provider.as_ref(),
            &session,
            &self.history,
            Utc::now(),
        );

        let aggregation = aggregator.aggregate(&module.sources).await;
        info!(
            "Module {}: {} tracks from {} sources",
            module.id,
            aggregation.tracks.len(),
            module.sources.len()
        );

        let catalog = module.catalog();
        let mut rng = StdRng::from_os_rng();
        let tracks = apply_actions(
            &module.actions,
            aggregation.tracks,
            &catalog,
            &aggregator,
            &mut rng,
        )
        .await?;

        let sync = PlaylistWriter::new(self.provider.as_ref(), &session)
            .write(&module.destination, &tracks)
            .await?;

        Ok(RunOutcome {
            tracks,
            dropped_pages: aggregation.dropped_pages,
            failed_sources: aggregation.failed_sources,
            sync,
        })
    }

    /// Pulls plays newer than the newest stored one into the rolling history and
    /// drops entries older than `retention_days`. Returns the number of new plays.
    pub async fn sync_history(&self, user_id: &str, retention_days: i64) -> Result<usize> {
        let session = Session::open(user_id, &self.credentials, self.refresher.clone()).await?;
        let after = self.history.latest_played_at(user_id).await?;

        let provider = self.provider.as_ref();
        let plays = session
            .call(move |token| async move {
                provider.recently_played(&token, after, HISTORY_BATCH).await
            })
            .await?;

        let keep_after = utils::days_before(Utc::now(), retention_days);
        self.history.merge(user_id, plays, keep_after).await
    }
}
