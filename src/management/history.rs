use std::{collections::HashSet, path::PathBuf};

use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    management::{checked_id, read_json, write_json},
    types::{PlayedTrack, Track},
};

/// Rolling per-user listening history, kept sorted by `played_at` ascending.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn load(&self, user_id: &str) -> Result<Vec<PlayedTrack>> {
        Ok(read_json(&self.history_path(user_id)?)
            .await?
            .unwrap_or_default())
    }

    /// Tracks played at or after `since`, oldest first.
    pub async fn played_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Track>> {
        Ok(self
            .load(user_id)
            .await?
            .into_iter()
            .filter(|p| p.played_at >= since)
            .map(|p| p.track)
            .collect())
    }

    pub async fn latest_played_at(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load(user_id).await?.last().map(|p| p.played_at))
    }

    /// Merges `plays` into the stored history and drops entries older than `keep_after`.
    ///
    /// A play is identified by track id and timestamp, so re-fetching an overlapping
    /// window does not duplicate entries. Returns the number of new plays stored.
    pub async fn merge(
        &self,
        user_id: &str,
        plays: Vec<PlayedTrack>,
        keep_after: DateTime<Utc>,
    ) -> Result<usize> {
        let mut history = self.load(user_id).await?;
        let mut seen: HashSet<(String, DateTime<Utc>)> = history
            .iter()
            .map(|p| (p.track.id.clone(), p.played_at))
            .collect();

        let mut added = 0;
        for play in plays {
            if seen.insert((play.track.id.clone(), play.played_at)) {
                history.push(play);
                added += 1;
            }
        }

        history.retain(|p| p.played_at >= keep_after);
        history.sort_by_key(|p| p.played_at);

        write_json(&self.history_path(user_id)?, &history).await?;
        Ok(added)
    }

    fn history_path(&self, user_id: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        path.push(format!("history/{}.json", checked_id(user_id)?));
        Ok(path)
    }
}
