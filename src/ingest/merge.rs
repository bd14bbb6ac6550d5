// src/ingest/merge.rs
//! Unified merge: per-platform listen events → one table with a fixed column set.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ingest::types::{ListenEvent, Platform};

/// The common projection every platform is reduced to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub artist: String,
    pub title: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub hour_label: String,
    pub month: u32,
    /// Always `None` for YouTube, which reports no play duration.
    pub duration_ms: Option<i64>,
    pub platform: Platform,
}

impl From<&ListenEvent> for MergedRow {
    fn from(ev: &ListenEvent) -> Self {
        Self {
            artist: ev.artist.clone(),
            title: ev.title.clone(),
            date: ev.date,
            hour: ev.hour,
            hour_label: ev.hour_label(),
            month: ev.month,
            duration_ms: ev.duration_ms,
            platform: ev.platform,
        }
    }
}

/// Normalized events keyed by platform. A platform is present only if its
/// file was supplied and normalized without a fatal error.
#[derive(Debug, Clone, Default)]
pub struct PlatformEvents {
    sets: BTreeMap<Platform, Vec<ListenEvent>>,
}

impl PlatformEvents {
    pub fn insert(&mut self, platform: Platform, events: Vec<ListenEvent>) {
        self.sets.insert(platform, events);
    }

    pub fn get(&self, platform: Platform) -> Option<&[ListenEvent]> {
        self.sets.get(&platform).map(Vec::as_slice)
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.sets.keys().copied()
    }
}

/// Result of a merge. `Empty` is a signal for consumers, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MergeOutcome {
    Ok { rows: Vec<MergedRow> },
    Empty { reason: String },
}

impl MergeOutcome {
    pub fn rows(&self) -> &[MergedRow] {
        match self {
            MergeOutcome::Ok { rows } => rows,
            MergeOutcome::Empty { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MergeOutcome::Empty { .. })
    }
}

pub const REASON_NO_PLATFORMS: &str = "No platforms selected.";
pub const REASON_NO_UPLOADS: &str = "No data is available for the selected platforms.";
pub const REASON_FILTERED_OUT: &str = "No data found after filtering.";

/// Concatenate the selected platforms in spotify → youtube → apple order,
/// each in source order. Unselected platforms contribute nothing even when
/// their data is present.
pub fn merge(events: &PlatformEvents, selected: &[Platform]) -> MergeOutcome {
    if selected.is_empty() {
        return MergeOutcome::Empty {
            reason: REASON_NO_PLATFORMS.to_string(),
        };
    }

    let mut any_present = false;
    let mut rows = Vec::new();
    for platform in Platform::ALL {
        if !selected.contains(&platform) {
            continue;
        }
        if let Some(set) = events.get(platform) {
            any_present = true;
            rows.extend(set.iter().map(MergedRow::from));
        }
    }

    if rows.is_empty() {
        let reason = if any_present {
            REASON_FILTERED_OUT
        } else {
            REASON_NO_UPLOADS
        };
        return MergeOutcome::Empty {
            reason: reason.to_string(),
        };
    }
    MergeOutcome::Ok { rows }
}
