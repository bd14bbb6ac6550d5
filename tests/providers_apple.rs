// tests/providers_apple.rs
use listnd::ingest::providers::AppleNormalizer;
use listnd::ingest::types::{Platform, PlatformNormalizer, YearSet};
use listnd::IngestError;

fn y2024() -> YearSet {
    [2024].into_iter().collect()
}

#[test]
fn fixture_keeps_songs_in_year() {
    let raw = include_bytes!("fixtures/apple_play_activity.csv");
    let out = AppleNormalizer::default().normalize(raw, &y2024()).unwrap();

    assert_eq!(out.stats.rows_read, 4);
    assert_eq!(out.stats.rows_filtered, 1);
    assert_eq!(out.stats.outside_years, 1);
    assert_eq!(out.events.len(), 2);

    let q = &out.events[0];
    assert_eq!((q.artist.as_str(), q.title.as_str()), ("Artist C", "Song Q"));
    assert_eq!(q.duration_ms, Some(180_000));
    assert_eq!(q.hour, 21);
    assert_eq!(q.hour_label(), "9 PM");

    // empty duration cell
    assert_eq!(out.events[1].duration_ms, None);
    assert_eq!(out.events[1].platform, Platform::Apple);
}

#[test]
fn missing_column_is_a_schema_error() {
    let raw = "Artist Name,Content Name,Event End Timestamp\nA,B,2024-01-01T00:00:00Z\n";
    let err = AppleNormalizer::default()
        .normalize(raw.as_bytes(), &y2024())
        .unwrap_err();
    assert_eq!(
        err,
        IngestError::Schema {
            platform: Platform::Apple,
            field: "Content Specific Type".into()
        }
    );
}

#[test]
fn float_durations_are_accepted() {
    let raw = "Content Specific Type,Event End Timestamp,Artist Name,\
               Content Name,End Position In Milliseconds\n\
               Song,2024-05-05 08:00:00,A,B,1234.0\n";
    let out = AppleNormalizer::default()
        .normalize(raw.as_bytes(), &y2024())
        .unwrap();
    assert_eq!(out.events[0].duration_ms, Some(1234));
    assert_eq!(out.events[0].hour, 8);
}
