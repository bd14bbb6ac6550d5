// tests/ingest_reconcile.rs
//
// Reconciliation properties over generated titles and artist names.

use listnd::ingest::config::PipelineConfig;
use listnd::ingest::reconcile::{Provisional, Reconciler, TrustedArtists};
use proptest::prelude::*;

fn reconciler(trusted: &[&str]) -> Reconciler {
    Reconciler::with_trusted(
        TrustedArtists::new(trusted.iter().copied()),
        " - Topic",
        &PipelineConfig::default().title_boilerplate,
    )
}

#[test]
fn longest_trusted_name_wins() {
    let records = vec![
        Provisional {
            channel: "Eve - Topic".into(),
            title: "Who's That Girl".into(),
        },
        Provisional {
            channel: "Steve Wonder - Topic".into(),
            title: "Superstition".into(),
        },
        Provisional {
            channel: "Fan Uploads".into(),
            title: "Steve Wonder - Sir Duke (Audio)".into(),
        },
    ];
    let r = Reconciler::build(&records, " - Topic", &PipelineConfig::default().title_boilerplate);
    let out = r.reconcile(&records[2]);
    assert_eq!(out.artist, "Steve Wonder");
    assert_eq!(out.title, "Sir Duke");
}

#[test]
fn trusted_names_are_removed_from_every_title() {
    let r = reconciler(&["ABBA"]);
    let out = r.reconcile(&Provisional {
        channel: "Queen - Topic".into(),
        title: "Dancing Queen (abba cover)".into(),
    });
    assert_eq!(out.artist, "Queen");
    assert_eq!(out.title, "Dancing  ( cover)");
}

#[test]
fn empty_trusted_set_leaves_channel_artists() {
    let r = reconciler(&[]);
    let out = r.reconcile(&Provisional {
        channel: "Uploader".into(),
        title: "Song (Official Music Video)".into(),
    });
    assert_eq!(out.artist, "Uploader");
    assert_eq!(out.title, "Song");
    assert!(out.unresolved);
}

proptest! {
    #[test]
    fn cleaning_is_idempotent(
        title in "[A-Za-z ()-]{0,40}",
        artist in "[A-Za-z]{1,6}",
        trusted in proptest::collection::vec("[A-Za-z]{1,6}", 0..4),
    ) {
        let names: Vec<&str> = trusted.iter().map(String::as_str).collect();
        let r = reconciler(&names);
        let once = r.clean_title(&title, &artist);
        let twice = r.clean_title(&once, &artist);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn title_never_contains_own_artist(
        title in "[A-Za-z ()-]{0,40}",
        artist in "[A-Za-z]{1,6}",
        trusted in proptest::collection::vec("[A-Za-z]{1,6}", 0..4),
    ) {
        let names: Vec<&str> = trusted.iter().map(String::as_str).collect();
        let r = reconciler(&names);
        let cleaned = r.clean_title(&format!("{artist} {title}"), &artist);
        prop_assert!(!cleaned.to_lowercase().contains(&artist.to_lowercase()));
        prop_assert_eq!(cleaned.trim(), cleaned.as_str());
    }
}
