// tests/ingest_merge.rs
use chrono::NaiveDate;
use listnd::ingest::merge::{merge, MergeOutcome, PlatformEvents, REASON_NO_UPLOADS};
use listnd::{ListenEvent, Platform};

fn events(platform: Platform, n: usize) -> Vec<ListenEvent> {
    (0..n)
        .map(|i| {
            let ts = NaiveDate::from_ymd_opt(2024, 4, 1 + i as u32)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap();
            let ms = (platform != Platform::Youtube).then_some(1000);
            ListenEvent::new(platform, format!("Artist {i}"), format!("Song {i}"), ts, ms)
        })
        .collect()
}

#[test]
fn all_platforms_concatenate_in_order() {
    let mut e = PlatformEvents::default();
    e.insert(Platform::Apple, events(Platform::Apple, 1));
    e.insert(Platform::Youtube, events(Platform::Youtube, 3));
    e.insert(Platform::Spotify, events(Platform::Spotify, 2));

    let out = merge(&e, &Platform::ALL);
    let rows = out.rows();
    assert_eq!(rows.len(), 6);

    let tags: Vec<Platform> = rows.iter().map(|r| r.platform).collect();
    use Platform::*;
    assert_eq!(tags, vec![Spotify, Spotify, Youtube, Youtube, Youtube, Apple]);
    assert!(rows
        .iter()
        .filter(|r| r.platform == Youtube)
        .all(|r| r.duration_ms.is_none()));
    assert!(rows.iter().all(|r| r.hour_label == "1 PM"));
}

#[test]
fn unselected_platforms_are_excluded() {
    let mut e = PlatformEvents::default();
    e.insert(Platform::Spotify, events(Platform::Spotify, 2));
    e.insert(Platform::Youtube, events(Platform::Youtube, 3));

    let out = merge(&e, &[Platform::Spotify]);
    assert_eq!(out.rows().len(), 2);
    assert!(out.rows().iter().all(|r| r.platform == Platform::Spotify));
}

#[test]
fn empty_result_serializes_as_status() {
    let out = merge(&PlatformEvents::default(), &[Platform::Apple]);
    assert!(out.is_empty());
    let v = serde_json::to_value(&out).unwrap();
    assert_eq!(v["status"], "empty");
    assert_eq!(v["reason"], REASON_NO_UPLOADS);

    let mut e = PlatformEvents::default();
    e.insert(Platform::Apple, events(Platform::Apple, 1));
    let v = serde_json::to_value(merge(&e, &[Platform::Apple])).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["rows"][0]["date"], "2024-04-01");
    assert!(matches!(merge(&e, &[Platform::Apple]), MergeOutcome::Ok { .. }));
}
