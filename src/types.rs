use std::{
    collections::{BTreeSet, HashMap, HashSet},
    hash::{Hash, Hasher},
    num::NonZeroU32,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::{Error, Result};

pub type SourceId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
    /// Unix timestamp (seconds) after which the access token is no longer valid.
    pub expires_at: i64,
}

/// A track as the pipeline sees it. Two tracks are equal when their ids match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub name: String,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One page of an offset paginated listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Track>,
    pub next: Option<String>,
    pub offset: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedTrack {
    pub track: Track,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagingResponse {
    pub items: Vec<TrackItem>,
    pub next: Option<String>,
    pub offset: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    pub track: Option<TrackObject>,
}

/// Track as the Web API returns it. Local files carry no id; removed tracks no uri.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TrackObject {
    pub fn into_track(self) -> Option<Track> {
        match (self.id, self.uri) {
            (Some(id), Some(uri)) => Some(Track {
                id,
                uri,
                name: self.name.unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayedResponse {
    pub items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistoryItem {
    pub track: TrackObject,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackRef {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl IntervalUnit {
    /// Length of the unit in days for lookback windows.
    pub fn days(self) -> i64 {
        match self {
            IntervalUnit::Days => 1,
            IntervalUnit::Weeks => 7,
            IntervalUnit::Months => 30,
            IntervalUnit::Years => 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    LikedTracks,
    Playlist {
        playlist_id: String,
    },
    RecentlyListened {
        quantity: NonZeroU32,
        unit: IntervalUnit,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSource {
    pub id: SourceId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(flatten)]
    pub kind: SourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleAction {
    Shuffle,
    Filter {
        excluded_source_ids: BTreeSet<SourceId>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Clear the destination, then write the final list.
    #[default]
    Replace,
    /// Write the final list after the existing content.
    Append,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub playlist_id: String,
    #[serde(default)]
    pub mode: SyncMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    pub sources: Vec<ModuleSource>,
    /// Sources that only actions refer to; they never contribute tracks themselves.
    #[serde(default)]
    pub references: Vec<ModuleSource>,
    #[serde(default)]
    pub actions: Vec<ModuleAction>,
    pub destination: Destination,
    #[serde(default)]
    pub schedule_id: Option<String>,
}

impl Module {
    /// Every source the module declares, addressable by id.
    pub fn catalog(&self) -> HashMap<&str, &ModuleSource> {
        self.sources
            .iter()
            .chain(self.references.iter())
            .map(|s| (s.id.as_str(), s))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("module id must not be empty".to_string()));
        }
        if self.destination.playlist_id.trim().is_empty() {
            return Err(Error::Validation(format!(
                "module {} has no destination playlist",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for source in self.sources.iter().chain(self.references.iter()) {
            if !seen.insert(source.id.as_str()) {
                return Err(Error::Validation(format!(
                    "module {} declares source {} twice",
                    self.id, source.id
                )));
            }
        }

        for action in &self.actions {
            if let ModuleAction::Filter {
                excluded_source_ids,
            } = action
            {
                if let Some(unknown) = excluded_source_ids
                    .iter()
                    .find(|id| !seen.contains(id.as_str()))
                {
                    return Err(Error::Validation(format!(
                        "filter in module {} refers to unknown source {}",
                        self.id, unknown
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Calendar pattern a schedule repeats on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum RepetitionRule {
    Days {
        quantity: NonZeroU32,
    },
    Weeks {
        quantity: NonZeroU32,
        /// Weekday indices, Sunday = 0.
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        days_of_week: BTreeSet<u8>,
    },
    Months {
        quantity: NonZeroU32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refinement: Option<MonthRefinement>,
    },
    Years {
        quantity: NonZeroU32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthRefinement {
    DayOfMonth(u32),
    /// `week` is 1-based; 5 means the last occurrence when a month has only four.
    DayOfWeekOfMonth { week: u8, weekday: u8 },
}

impl RepetitionRule {
    pub fn validate(&self) -> Result<()> {
        match self {
            RepetitionRule::Weeks { days_of_week, .. } => {
                if let Some(day) = days_of_week.iter().find(|d| **d > 6) {
                    return Err(Error::Validation(format!(
                        "weekday index {} out of range 0-6",
                        day
                    )));
                }
            }
            RepetitionRule::Months {
                refinement: Some(MonthRefinement::DayOfMonth(day)),
                ..
            } => {
                if !(1..=31).contains(day) {
                    return Err(Error::Validation(format!(
                        "day of month {} out of range 1-31",
                        day
                    )));
                }
            }
            RepetitionRule::Months {
                refinement: Some(MonthRefinement::DayOfWeekOfMonth { week, weekday }),
                ..
            } => {
                if !(1..=5).contains(week) || *weekday > 6 {
                    return Err(Error::Validation(format!(
                        "week {} / weekday {} out of range",
                        week, weekday
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub module_id: String,
    #[serde(default)]
    pub next_trigger: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repetition_rule: Option<RepetitionRule>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
    #[serde(default)]
    pub has_armed_timer: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub module_id: String,
    pub timestamp: DateTime<Utc>,
    pub was_scheduled: bool,
    pub failed: bool,
}

/// Body of `POST /invoke`, also the callback payload handed to the timer facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    pub module_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub position: usize,
    pub name: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct TriggerTableRow {
    pub occurrence: usize,
    pub instant: String,
    pub cron: String,
}
