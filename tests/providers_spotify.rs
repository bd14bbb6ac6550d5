// tests/providers_spotify.rs
use listnd::ingest::providers::SpotifyNormalizer;
use listnd::ingest::types::{Platform, PlatformNormalizer, YearSet};
use listnd::IngestError;

fn years(ys: &[i32]) -> YearSet {
    ys.iter().copied().collect()
}

#[test]
fn account_export_without_duration() {
    let raw =
        br#"[{"endTime":"2024-03-05 10:00:00","artistName":"Artist A","trackName":"Song X"}]"#;
    let out = SpotifyNormalizer.normalize(raw, &years(&[2024])).unwrap();

    assert_eq!(out.events.len(), 1);
    let ev = &out.events[0];
    assert_eq!(ev.artist, "Artist A");
    assert_eq!(ev.title, "Song X");
    assert_eq!(ev.month, 3);
    assert_eq!(ev.hour, 10);
    assert_eq!(ev.year, 2024);
    assert_eq!(ev.duration_ms, None);
    assert_eq!(ev.platform, Platform::Spotify);
}

#[test]
fn fixture_filters_years_and_counts_bad_timestamps() {
    let raw = include_bytes!("fixtures/spotify_history.json");
    let out = SpotifyNormalizer.normalize(raw, &years(&[2024])).unwrap();

    assert_eq!(out.stats.rows_read, 4);
    assert_eq!(out.stats.outside_years, 1);
    assert_eq!(out.stats.rows_dropped, 1);
    assert_eq!(out.stats.events, 2);
    assert_eq!(out.events[1].hour_label(), "10 PM");
    assert_eq!(out.events[1].duration_ms, Some(215_000));
}

#[test]
fn multiple_years_are_kept() {
    let raw = include_bytes!("fixtures/spotify_history.json");
    let out = SpotifyNormalizer.normalize(raw, &years(&[2023, 2024])).unwrap();
    assert_eq!(out.events.len(), 3);
}

#[test]
fn missing_artist_field_rejects_the_file() {
    let raw = br#"[{"endTime":"2024-03-05 10:00:00","trackName":"Song X"}]"#;
    let err = SpotifyNormalizer.normalize(raw, &years(&[2024])).unwrap_err();
    assert_eq!(
        err,
        IngestError::Schema {
            platform: Platform::Spotify,
            field: "artistName".into()
        }
    );
    assert!(err.to_string().contains("Spotify"));
}

#[test]
fn garbage_is_a_decode_error() {
    let err = SpotifyNormalizer
        .normalize(b"\x00\x01 definitely not json", &years(&[2024]))
        .unwrap_err();
    assert!(matches!(err, IngestError::Decode { platform: Platform::Spotify, .. }));
}
