// src/ingest/providers/apple.rs
use serde::Deserialize;
use tracing::debug;

use crate::error::IngestError;
use crate::ingest::config::PipelineConfig;
use crate::ingest::reader::{lenient_millis, non_blank, read_csv, Required};
use crate::ingest::timestamp::parse_timestamp;
use crate::ingest::types::{ListenEvent, NormalizeOutput, Platform, PlatformNormalizer, YearSet};

/// The columns of `Apple Music Play Activity.csv` this crate reads; the
/// export has dozens more, which are ignored.
#[derive(Debug, Deserialize)]
struct ApplePlay {
    #[serde(rename = "Content Specific Type", default)]
    content_type: Option<String>,
    #[serde(rename = "Event End Timestamp", default)]
    event_end: Option<String>,
    #[serde(rename = "Artist Name", default)]
    artist_name: Option<String>,
    #[serde(rename = "Content Name", default)]
    content_name: Option<String>,
    #[serde(
        rename = "End Position In Milliseconds",
        default,
        deserialize_with = "lenient_millis"
    )]
    end_position_ms: Option<i64>,
}

const REQUIRED: &[Required] = &[
    Required::field("Content Specific Type"),
    Required::field("Event End Timestamp"),
    Required::field("Artist Name"),
    Required::field("Content Name"),
    Required::field("End Position In Milliseconds"),
];

#[derive(Debug, Clone)]
pub struct AppleNormalizer {
    content_type: String,
}

impl Default for AppleNormalizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl AppleNormalizer {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            content_type: cfg.apple_content_type.clone(),
        }
    }
}

impl PlatformNormalizer for AppleNormalizer {
    fn platform(&self) -> Platform {
        Platform::Apple
    }

    fn normalize(&self, raw: &[u8], years: &YearSet) -> Result<NormalizeOutput, IngestError> {
        let decoded = read_csv::<ApplePlay>(Platform::Apple, raw, REQUIRED)?;

        let mut out = NormalizeOutput::default();
        out.stats.rows_read = decoded.rows_read;
        out.stats.rows_dropped = decoded.rows_dropped;

        for play in decoded.records {
            if play.content_type.as_deref().map(str::trim) != Some(self.content_type.as_str()) {
                out.stats.rows_filtered += 1;
                continue;
            }
            let (Some(artist), Some(title), Some(end)) = (
                non_blank(play.artist_name),
                non_blank(play.content_name),
                play.event_end,
            ) else {
                out.stats.rows_dropped += 1;
                continue;
            };
            let Some(ts) = parse_timestamp(&end) else {
                debug!(target: "ingest", platform = "apple", raw = %end, "unparseable timestamp");
                out.stats.rows_dropped += 1;
                continue;
            };

            let event = ListenEvent::new(Platform::Apple, artist, title, ts, play.end_position_ms);
            if !years.contains(event.year) {
                out.stats.outside_years += 1;
                continue;
            }
            out.push(event);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_song_rows_are_filtered_not_dropped() {
        let raw = "Content Specific Type,Event End Timestamp,Artist Name,\
                   Content Name,End Position In Milliseconds\n\
                   Song,2024-02-10T21:05:00.000Z,Artist C,Song Q,180000\n\
                   Music Video,2024-02-10T21:10:00.000Z,Artist C,Clip,60000\n\
                   Song,,Artist C,No Time,1000\n";
        let years: YearSet = [2024].into_iter().collect();
        let out = AppleNormalizer::default()
            .normalize(raw.as_bytes(), &years)
            .unwrap();
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.stats.rows_filtered, 1);
        assert_eq!(out.stats.rows_dropped, 1);
        assert_eq!(out.events[0].title, "Song Q");
        assert_eq!(out.events[0].duration_ms, Some(180_000));
    }
}
