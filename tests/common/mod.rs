#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    num::NonZeroU32,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sporlflow::{
    error::{Error, ProviderError, Result},
    resilient::CredentialRefresher,
    schedule::TimerFacility,
    spotify::TrackProvider,
    types::{InvokeRequest, ModuleSource, Page, PlayedTrack, SourceKind, Token, Track},
};

pub const LIKED: &str = "liked";

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        uri: format!("spotify:track:{}", id),
        name: id.to_uppercase(),
    }
}

pub fn numbered_tracks(prefix: &str, count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| track(&format!("{}{}", prefix, i)))
        .collect()
}

pub fn ids(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.id.clone()).collect()
}

pub fn nz(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

pub fn playlist_source(id: &str, playlist_id: &str) -> ModuleSource {
    ModuleSource {
        id: id.to_string(),
        label: String::new(),
        artwork: None,
        kind: SourceKind::Playlist {
            playlist_id: playlist_id.to_string(),
        },
    }
}

pub fn liked_source(id: &str) -> ModuleSource {
    ModuleSource {
        id: id.to_string(),
        label: String::new(),
        artwork: None,
        kind: SourceKind::LikedTracks,
    }
}

pub fn token(access_token: &str, expires_at: i64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh".to_string(),
        scope: String::new(),
        expires_at,
    }
}

fn page(tracks: &[Track], offset: u32, limit: u32) -> Page {
    let start = (offset as usize).min(tracks.len());
    let end = (start + limit as usize).min(tracks.len());
    Page {
        items: tracks[start..end].to_vec(),
        next: (end < tracks.len()).then(|| format!("offset={}", end)),
        offset,
        total: tracks.len() as u32,
    }
}

fn server_error() -> ProviderError {
    ProviderError::Status {
        status: 500,
        body: "boom".to_string(),
    }
}

/// In-memory track provider. Saved tracks are listed under the key [`LIKED`].
#[derive(Default)]
pub struct FakeProvider {
    pub saved: Vec<Track>,
    pub playlists: HashMap<String, Vec<Track>>,
    pub plays: Vec<PlayedTrack>,
    /// Listings that fail on every page.
    pub broken: HashSet<String>,
    /// Failures left per (listing, offset) before the page succeeds.
    pub flaky: Mutex<HashMap<(String, u32), usize>>,
    pub page_calls: Mutex<HashMap<(String, u32), usize>>,
    /// Insert batches starting at this position fail.
    pub fail_add_at: Option<usize>,
    /// Calls carrying this token are answered with 401.
    pub rejected_token: Option<String>,
    /// Token that starts being rejected once this many insert batches are committed.
    pub expiring_token: Option<(String, usize)>,
    pub added: Mutex<Vec<(String, Vec<String>, Option<usize>)>>,
    pub removed: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeProvider {
    pub fn with_playlist(mut self, playlist_id: &str, tracks: Vec<Track>) -> Self {
        self.playlists.insert(playlist_id.to_string(), tracks);
        self
    }

    pub fn flaky_page(self, listing: &str, offset: u32, failures: usize) -> Self {
        self.flaky
            .lock()
            .unwrap()
            .insert((listing.to_string(), offset), failures);
        self
    }

    pub fn calls_for(&self, listing: &str, offset: u32) -> usize {
        self.page_calls
            .lock()
            .unwrap()
            .get(&(listing.to_string(), offset))
            .copied()
            .unwrap_or(0)
    }

    pub fn added(&self) -> Vec<(String, Vec<String>, Option<usize>)> {
        let mut added = self.added.lock().unwrap().clone();
        added.sort_by_key(|(_, _, position)| *position);
        added
    }

    pub fn removed(&self) -> Vec<(String, Vec<String>)> {
        self.removed.lock().unwrap().clone()
    }

    fn check_token(&self, token: &str) -> std::result::Result<(), ProviderError> {
        match &self.rejected_token {
            Some(rejected) if rejected == token => Err(ProviderError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn list(
        &self,
        listing: &str,
        tracks: Option<&Vec<Track>>,
        offset: u32,
        limit: u32,
    ) -> std::result::Result<Page, ProviderError> {
        *self
            .page_calls
            .lock()
            .unwrap()
            .entry((listing.to_string(), offset))
            .or_default() += 1;

        if self.broken.contains(listing) {
            return Err(server_error());
        }

        if let Some(remaining) = self
            .flaky
            .lock()
            .unwrap()
            .get_mut(&(listing.to_string(), offset))
        {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(server_error());
            }
        }

        match tracks {
            Some(tracks) => Ok(page(tracks, offset, limit)),
            None => Err(ProviderError::Status {
                status: 404,
                body: format!("no listing {}", listing),
            }),
        }
    }
}

#[async_trait]
impl TrackProvider for FakeProvider {
    async fn saved_tracks(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> std::result::Result<Page, ProviderError> {
        self.check_token(token)?;
        self.list(LIKED, Some(&self.saved), offset, limit)
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> std::result::Result<Page, ProviderError> {
        self.check_token(token)?;
        self.list(playlist_id, self.playlists.get(playlist_id), offset, limit)
    }

    async fn recently_played(
        &self,
        token: &str,
        after: Option<DateTime<Utc>>,
        limit: u32,
    ) -> std::result::Result<Vec<PlayedTrack>, ProviderError> {
        self.check_token(token)?;
        Ok(self
            .plays
            .iter()
            .filter(|p| after.is_none_or(|after| p.played_at > after))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
        position: Option<usize>,
    ) -> std::result::Result<(), ProviderError> {
        self.check_token(token)?;
        if let Some((expiring, after)) = &self.expiring_token {
            if expiring == token && self.added.lock().unwrap().len() >= *after {
                return Err(ProviderError::Unauthorized);
            }
        }
        if position.is_some() && position == self.fail_add_at {
            return Err(server_error());
        }
        self.added
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), uris.to_vec(), position));
        Ok(())
    }

    async fn remove_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> std::result::Result<(), ProviderError> {
        self.check_token(token)?;
        self.removed
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), uris.to_vec()));
        Ok(())
    }
}

/// Hands out a fixed token and counts refreshes.
pub struct FakeRefresher {
    pub fresh_token: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeRefresher {
    pub fn new(fresh_token: &str) -> Self {
        Self {
            fresh_token: fresh_token.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("unused")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialRefresher for FakeRefresher {
    async fn refresh(&self, _user_id: &str) -> std::result::Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Refresh("refresh token revoked".to_string()));
        }
        Ok(self.fresh_token.clone())
    }
}

/// Records arm and disarm requests instead of talking to a timer service.
#[derive(Default)]
pub struct FakeTimer {
    pub fail_arm: bool,
    pub armed: Mutex<Vec<(String, String, InvokeRequest)>>,
    pub disarmed: Mutex<Vec<String>>,
}

impl FakeTimer {
    pub fn failing() -> Self {
        Self {
            fail_arm: true,
            ..Self::default()
        }
    }

    pub fn armed(&self) -> Vec<(String, String, InvokeRequest)> {
        self.armed.lock().unwrap().clone()
    }

    pub fn disarm_count(&self) -> usize {
        self.disarmed.lock().unwrap().len()
    }
}

#[async_trait]
impl TimerFacility for FakeTimer {
    async fn arm(&self, schedule_id: &str, cron: &str, payload: &InvokeRequest) -> Result<()> {
        if self.fail_arm {
            return Err(Error::SchedulingBackend("timer service unreachable".to_string()));
        }
        self.armed
            .lock()
            .unwrap()
            .push((schedule_id.to_string(), cron.to_string(), payload.clone()));
        Ok(())
    }

    async fn disarm(&self, schedule_id: &str) -> Result<()> {
        self.disarmed.lock().unwrap().push(schedule_id.to_string());
        Ok(())
    }
}
