// src/ingest/providers/youtube.rs
//! YouTube Music normalizer (Google Takeout `watch-history.json`).
//!
//! Order of work:
//! 1. keep music activity only (the `header` tag);
//! 2. parse the time and filter by year;
//! 3. strip the anchored "Watched " prefix from the title;
//! 4. drop entries whose `subtitles` is not a usable list (no artist to recover);
//! 5. take the first subtitle name as the provisional artist and replace the
//!    "•"/"·" separator glyphs with spaces in artist and title;
//! 6. reconcile artist and title across the whole history.

use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::IngestError;
use crate::ingest::config::PipelineConfig;
use crate::ingest::reader::{read_json_array, Required};
use crate::ingest::reconcile::{Provisional, Reconciler};
use crate::ingest::timestamp::parse_timestamp;
use crate::ingest::types::{ListenEvent, NormalizeOutput, Platform, PlatformNormalizer, YearSet};

#[derive(Debug, Deserialize)]
struct Subtitle {
    name: String,
}

/// `subtitles` is a list of channels, or absent/null/scalar when the video
/// has no channel attached (deleted or private uploads).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubtitlesField {
    List(Vec<Subtitle>),
    Other(Value),
}

impl Default for SubtitlesField {
    fn default() -> Self {
        SubtitlesField::Other(Value::Null)
    }
}

/// One watch-history entry. `titleUrl`, `products`, `activityControls`,
/// `description` and `details` are not read.
#[derive(Debug, Deserialize)]
struct WatchEntry {
    header: String,
    title: String,
    time: String,
    #[serde(default)]
    subtitles: SubtitlesField,
}

/// Where the artist of an entry can come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArtistSource {
    Channel(String),
    Unrecoverable,
}

impl From<SubtitlesField> for ArtistSource {
    fn from(field: SubtitlesField) -> Self {
        match field {
            SubtitlesField::List(list) => match list.into_iter().next() {
                Some(first) if !first.name.trim().is_empty() => ArtistSource::Channel(first.name),
                _ => ArtistSource::Unrecoverable,
            },
            SubtitlesField::Other(_) => ArtistSource::Unrecoverable,
        }
    }
}

const REQUIRED: &[Required] = &[
    Required::field("header"),
    Required::field("title"),
    Required::field("time"),
];

/// "•" and "·" are used as visual separators in YouTube titles and channel names.
pub fn replace_separators(s: &str) -> String {
    s.replace(['•', '·'], " ")
}

#[derive(Debug, Clone)]
pub struct YoutubeNormalizer {
    header: String,
    watched_prefix: String,
    topic_suffix: String,
    boilerplate: Vec<String>,
}

impl Default for YoutubeNormalizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl YoutubeNormalizer {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            header: cfg.youtube_header.clone(),
            watched_prefix: cfg.watched_prefix.clone(),
            topic_suffix: cfg.topic_suffix.clone(),
            boilerplate: cfg.title_boilerplate.clone(),
        }
    }

    fn strip_watched<'a>(&self, title: &'a str) -> &'a str {
        if self.watched_prefix.is_empty() {
            return title;
        }
        title.strip_prefix(self.watched_prefix.as_str()).unwrap_or(title)
    }
}

impl PlatformNormalizer for YoutubeNormalizer {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn normalize(&self, raw: &[u8], years: &YearSet) -> Result<NormalizeOutput, IngestError> {
        let decoded = read_json_array::<WatchEntry>(Platform::Youtube, raw, REQUIRED)?;

        let mut out = NormalizeOutput::default();
        out.stats.rows_read = decoded.rows_read;
        out.stats.rows_dropped = decoded.rows_dropped;

        let mut pending: Vec<(Provisional, NaiveDateTime)> = Vec::new();
        for entry in decoded.records {
            if entry.header != self.header {
                out.stats.rows_filtered += 1;
                continue;
            }
            let Some(ts) = parse_timestamp(&entry.time) else {
                debug!(
                    target: "ingest",
                    platform = "youtube",
                    raw = %entry.time,
                    "unparseable timestamp"
                );
                out.stats.rows_dropped += 1;
                continue;
            };
            if !years.contains(ts.year()) {
                out.stats.outside_years += 1;
                continue;
            }

            let title = self.strip_watched(&entry.title);
            let ArtistSource::Channel(channel) = ArtistSource::from(entry.subtitles) else {
                out.stats.rows_dropped += 1;
                continue;
            };

            pending.push((
                Provisional {
                    channel: replace_separators(&channel),
                    title: replace_separators(title),
                },
                ts,
            ));
        }

        let reconciler = Reconciler::build(
            pending.iter().map(|(p, _)| p),
            &self.topic_suffix,
            &self.boilerplate,
        );

        for (record, ts) in &pending {
            let r = reconciler.reconcile(record);
            if r.artist.is_empty() {
                out.stats.rows_dropped += 1;
                continue;
            }
            if r.unresolved {
                out.stats.unresolved_artists += 1;
                debug!(
                    target: "reconcile",
                    channel = %record.channel,
                    "artist left as uploader channel"
                );
            }
            out.push(ListenEvent::new(Platform::Youtube, r.artist, r.title, *ts, None));
        }

        Ok(out)
    }
}
