// src/ingest/types.rs
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, UnknownPlatform};
use crate::ingest::timestamp::hour_label;

/// One of the supported streaming services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Spotify,
    Youtube,
    Apple,
}

impl Platform {
    /// Fixed concatenation order used by the merge.
    pub const ALL: [Platform; 3] = [Platform::Spotify, Platform::Youtube, Platform::Apple];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::Youtube => "youtube",
            Platform::Apple => "apple",
        }
    }

    /// Human-facing service name, used in user-visible messages.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::Youtube => "YouTube Music",
            Platform::Apple => "Apple Music",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "youtube" | "youtube music" | "youtube_music" => Ok(Platform::Youtube),
            "apple" | "apple music" | "apple_music" => Ok(Platform::Apple),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// Calendar years a run is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSet(BTreeSet<i32>);

impl YearSet {
    pub fn contains(&self, year: i32) -> bool {
        self.0.contains(&year)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<i32> for YearSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One normalized play.
///
/// `timestamp` is the wall-clock time the listen ended as the source reports
/// it: local time for Spotify/Apple naive stamps, UTC for zoned stamps.
/// `date`, `month`, `hour` and `year` are always derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListenEvent {
    pub artist: String,
    pub title: String,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub month: u32,
    /// 0–23; see [`ListenEvent::hour_label`] for the 12-hour form.
    pub hour: u32,
    pub year: i32,
    pub duration_ms: Option<i64>,
    pub platform: Platform,
}

impl ListenEvent {
    pub fn new(
        platform: Platform,
        artist: String,
        title: String,
        timestamp: NaiveDateTime,
        duration_ms: Option<i64>,
    ) -> Self {
        Self {
            artist,
            title,
            date: timestamp.date(),
            month: timestamp.month(),
            hour: timestamp.hour(),
            year: timestamp.year(),
            timestamp,
            duration_ms,
            platform,
        }
    }

    /// "1 PM", "12 AM", ...
    pub fn hour_label(&self) -> String {
        hour_label(self.hour)
    }
}

/// Per-platform bookkeeping for one normalization call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Records decoded from the file (before any filtering).
    pub rows_read: usize,
    /// Records of another kind (non-music YouTube activity, non-song Apple content).
    pub rows_filtered: usize,
    /// Records missing a required value, with a bad timestamp, or with no recoverable artist.
    pub rows_dropped: usize,
    /// Records outside the requested years.
    pub outside_years: usize,
    /// YouTube records whose artist stayed the uploader channel name.
    pub unresolved_artists: usize,
    /// Listen events produced.
    pub events: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutput {
    pub events: Vec<ListenEvent>,
    pub stats: NormalizeStats,
}

impl NormalizeOutput {
    pub(crate) fn push(&mut self, event: ListenEvent) {
        self.events.push(event);
        self.stats.events = self.events.len();
    }
}

/// Turns one platform's raw export into listen events.
pub trait PlatformNormalizer: Send + Sync {
    fn platform(&self) -> Platform;

    /// An empty result is `Ok` with no events; `Err` means the whole file is unusable.
    fn normalize(&self, raw: &[u8], years: &YearSet) -> Result<NormalizeOutput, IngestError>;
}
