// src/ingest/providers/spotify.rs
use serde::Deserialize;
use tracing::debug;

use crate::error::IngestError;
use crate::ingest::reader::{lenient_millis, non_blank, read_json_array, Required};
use crate::ingest::timestamp::parse_timestamp;
use crate::ingest::types::{ListenEvent, NormalizeOutput, Platform, PlatformNormalizer, YearSet};

/// One entry of `StreamingHistory_music_*.json`. The extended streaming
/// history (`endsong_*.json`) uses different keys for the same values.
#[derive(Debug, Deserialize)]
struct SpotifyPlay {
    #[serde(rename = "endTime", alias = "ts")]
    end_time: String,
    #[serde(rename = "artistName", alias = "master_metadata_album_artist_name", default)]
    artist_name: Option<String>,
    #[serde(rename = "trackName", alias = "master_metadata_track_name", default)]
    track_name: Option<String>,
    #[serde(
        rename = "msPlayed",
        alias = "ms_played",
        default,
        deserialize_with = "lenient_millis"
    )]
    ms_played: Option<i64>,
}

const REQUIRED: &[Required] = &[
    Required::with_aliases("endTime", &["ts"]),
    Required::with_aliases("artistName", &["master_metadata_album_artist_name"]),
    Required::with_aliases("trackName", &["master_metadata_track_name"]),
];

/// Spotify's export is already clean per field; only timestamps need work.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpotifyNormalizer;

impl PlatformNormalizer for SpotifyNormalizer {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    fn normalize(&self, raw: &[u8], years: &YearSet) -> Result<NormalizeOutput, IngestError> {
        let decoded = read_json_array::<SpotifyPlay>(Platform::Spotify, raw, REQUIRED)?;

        let mut out = NormalizeOutput::default();
        out.stats.rows_read = decoded.rows_read;
        out.stats.rows_dropped = decoded.rows_dropped;

        for play in decoded.records {
            // podcast episodes in the extended history carry null track fields
            let (Some(artist), Some(title)) =
                (non_blank(play.artist_name), non_blank(play.track_name))
            else {
                out.stats.rows_dropped += 1;
                continue;
            };
            let Some(ts) = parse_timestamp(&play.end_time) else {
                debug!(
                    target: "ingest",
                    platform = "spotify",
                    raw = %play.end_time,
                    "unparseable timestamp"
                );
                out.stats.rows_dropped += 1;
                continue;
            };

            let event = ListenEvent::new(Platform::Spotify, artist, title, ts, play.ms_played);
            if !years.contains(event.year) {
                out.stats.outside_years += 1;
                continue;
            }
            out.push(event);
        }

        Ok(out)
    }
}
