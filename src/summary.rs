// src/summary.rs
//! Aggregations over merged rows for the dashboard.
//!
//! Every ranking breaks ties by count (descending) and then by key
//! (ascending), so results are stable across runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ingest::merge::MergedRow;
use crate::ingest::timestamp::hour_label;
use crate::ingest::types::Platform;

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    #[default]
    Artists,
    Songs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongCount {
    pub title: String,
    pub artist: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistCount {
    pub artist: String,
    pub count: usize,
}

/// An artist or a song title, depending on [`Subject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongTrend {
    pub title: String,
    pub monthly: Vec<MonthCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTopArtists {
    pub month: u32,
    pub artists: Vec<ArtistCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatCell {
    pub weekday: String,
    pub hour_label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistProfile {
    pub artist: String,
    pub first_listen: NaiveDate,
    pub listens: usize,
    /// Up to three most played titles.
    pub top_songs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDay {
    pub date: NaiveDate,
    pub platform: Platform,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusiestDay {
    pub date: NaiveDate,
    pub count: usize,
    pub top_artist: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatedSong {
    pub title: String,
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistHours {
    pub artist: String,
    pub hours: f64,
}

/// Top artists by time listened, compared with the top artists by plays over
/// the same rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoursRanking {
    pub top: Vec<ArtistHours>,
    pub same_artists_as_plays: bool,
    pub same_order_as_plays: bool,
    /// YouTube rows were part of the input but carry no duration.
    pub excludes_youtube: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListeningFacts {
    pub busiest_day: Option<BusiestDay>,
    pub most_repeated: Option<RepeatedSong>,
    /// Distinct (date, title) pairs.
    pub song_days: usize,
    pub hours: Option<HoursRanking>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    pub months: Vec<u32>,
    pub subject: Subject,
    /// Artist for the profile; the top artist when unset.
    pub artist: Option<String>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            months: vec![1],
            subject: Subject::Artists,
            artist: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub top_songs: Vec<SongCount>,
    pub top_artists: Vec<ArtistCount>,
    pub song_trend: Vec<SongTrend>,
    pub top_artists_per_month: Vec<MonthTopArtists>,
    pub monthly_top: Vec<NamedCount>,
    pub weekly_heatmap: Vec<HeatCell>,
    pub artist_profile: Option<ArtistProfile>,
    pub platform_daily: Vec<PlatformDay>,
    pub facts: ListeningFacts,
}

/// Counts sorted by count desc, key asc. `BTreeMap` already yields keys in
/// ascending order and the sort is stable.
fn ranked<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut v: Vec<(K, usize)> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1));
    v
}

fn count_by<'a, K, F>(rows: impl IntoIterator<Item = &'a MergedRow>, key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&'a MergedRow) -> K,
{
    let mut counts = BTreeMap::new();
    for r in rows {
        *counts.entry(key(r)).or_insert(0) += 1;
    }
    counts
}

pub fn top_songs(rows: &[MergedRow], n: usize) -> Vec<SongCount> {
    ranked(count_by(rows, |r| (r.title.as_str(), r.artist.as_str())))
        .into_iter()
        .take(n)
        .map(|((title, artist), count)| SongCount {
            title: title.to_string(),
            artist: artist.to_string(),
            count,
        })
        .collect()
}

pub fn top_artists(rows: &[MergedRow], n: usize) -> Vec<ArtistCount> {
    ranked(count_by(rows, |r| r.artist.as_str()))
        .into_iter()
        .take(n)
        .map(|(artist, count)| ArtistCount {
            artist: artist.to_string(),
            count,
        })
        .collect()
}

/// Monthly play counts for the titles of the top-n songs, in rank order.
pub fn song_trend(rows: &[MergedRow], n: usize) -> Vec<SongTrend> {
    let mut titles: Vec<String> = Vec::new();
    for s in top_songs(rows, n) {
        if !titles.contains(&s.title) {
            titles.push(s.title);
        }
    }

    titles
        .into_iter()
        .map(|title| {
            let monthly = count_by(rows.iter().filter(|r| r.title == title), |r| r.month)
                .into_iter()
                .map(|(month, count)| MonthCount { month, count })
                .collect();
            SongTrend { title, monthly }
        })
        .collect()
}

/// Top-k artists of each month that has any plays.
pub fn top_artists_per_month(rows: &[MergedRow], k: usize) -> Vec<MonthTopArtists> {
    (1..=12)
        .filter_map(|month| {
            let in_month: Vec<MergedRow> =
                rows.iter().filter(|r| r.month == month).cloned().collect();
            if in_month.is_empty() {
                return None;
            }
            Some(MonthTopArtists {
                month,
                artists: top_artists(&in_month, k),
            })
        })
        .collect()
}

/// Top-n artists, or song titles, over the selected months.
pub fn monthly_top(
    rows: &[MergedRow],
    months: &[u32],
    subject: Subject,
    n: usize,
) -> Vec<NamedCount> {
    let selected = rows.iter().filter(|r| months.contains(&r.month));
    let counts = match subject {
        Subject::Artists => count_by(selected, |r| r.artist.as_str()),
        Subject::Songs => count_by(selected, |r| r.title.as_str()),
    };
    ranked(counts)
        .into_iter()
        .take(n)
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

/// Plays by (weekday, hour), Monday first and midnight first. Empty cells are omitted.
pub fn weekly_heatmap(rows: &[MergedRow]) -> Vec<HeatCell> {
    let counts = count_by(rows, |r| (r.date.weekday().num_days_from_monday(), r.hour));
    let mut names: BTreeMap<u32, String> = BTreeMap::new();
    for r in rows {
        names
            .entry(r.date.weekday().num_days_from_monday())
            .or_insert_with(|| r.date.format("%A").to_string());
    }
    counts
        .into_iter()
        .map(|((day, hour), count)| HeatCell {
            weekday: names.get(&day).cloned().unwrap_or_default(),
            hour_label: hour_label(hour),
            count,
        })
        .collect()
}

pub fn artist_profile(rows: &[MergedRow], artist: &str) -> Option<ArtistProfile> {
    let theirs: Vec<&MergedRow> = rows.iter().filter(|r| r.artist == artist).collect();
    let first_listen = theirs.iter().map(|r| r.date).min()?;
    let top_songs = ranked(count_by(theirs.iter().copied(), |r| r.title.as_str()))
        .into_iter()
        .take(3)
        .map(|(t, _)| t.to_string())
        .collect();
    Some(ArtistProfile {
        artist: artist.to_string(),
        first_listen,
        listens: theirs.len(),
        top_songs,
    })
}

pub fn platform_daily(rows: &[MergedRow]) -> Vec<PlatformDay> {
    count_by(rows, |r| (r.date, r.platform))
        .into_iter()
        .map(|((date, platform), count)| PlatformDay {
            date,
            platform,
            count,
        })
        .collect()
}

pub fn listening_facts(rows: &[MergedRow]) -> ListeningFacts {
    let busiest_day = ranked(count_by(rows, |r| r.date))
        .into_iter()
        .next()
        .and_then(|(date, count)| {
            let on_day: Vec<MergedRow> = rows.iter().filter(|r| r.date == date).cloned().collect();
            top_artists(&on_day, 1).into_iter().next().map(|a| BusiestDay {
                date,
                count,
                top_artist: a.artist,
            })
        });

    let song_days = count_by(rows, |r| (r.date, r.title.as_str()));
    let distinct = song_days.len();
    let most_repeated = ranked(song_days)
        .into_iter()
        .next()
        .map(|((date, title), count)| RepeatedSong {
            title: title.to_string(),
            date,
            count,
        });

    ListeningFacts {
        busiest_day,
        most_repeated,
        song_days: distinct,
        hours: hours_ranking(rows),
    }
}

fn hours_ranking(rows: &[MergedRow]) -> Option<HoursRanking> {
    let timed: Vec<MergedRow> = rows
        .iter()
        .filter(|r| r.duration_ms.is_some())
        .cloned()
        .collect();
    if timed.is_empty() {
        return None;
    }

    // i128: per-play durations are only bounded by i64, their sum is not
    let mut ms_by_artist: BTreeMap<&str, i128> = BTreeMap::new();
    for r in &timed {
        *ms_by_artist.entry(r.artist.as_str()).or_insert(0) +=
            i128::from(r.duration_ms.unwrap_or(0));
    }
    let mut by_ms: Vec<(&str, i128)> = ms_by_artist.into_iter().collect();
    by_ms.sort_by(|a, b| b.1.cmp(&a.1));
    let top: Vec<ArtistHours> = by_ms
        .into_iter()
        .take(5)
        .map(|(artist, ms)| ArtistHours {
            artist: artist.to_string(),
            hours: ms as f64 / MS_PER_HOUR,
        })
        .collect();

    let by_hours: Vec<&str> = top.iter().map(|a| a.artist.as_str()).collect();
    let plays = top_artists(&timed, 5);
    let by_plays: Vec<&str> = plays.iter().map(|a| a.artist.as_str()).collect();
    let same_artists =
        by_hours.iter().collect::<BTreeSet<_>>() == by_plays.iter().collect::<BTreeSet<_>>();

    Some(HoursRanking {
        same_order_as_plays: by_hours == by_plays,
        same_artists_as_plays: same_artists,
        excludes_youtube: rows.iter().any(|r| r.platform == Platform::Youtube),
        top,
    })
}

pub fn summarize(rows: &[MergedRow], opts: &SummaryOptions) -> Summary {
    let top_artists_all = top_artists(rows, 10);
    let profile_artist = opts
        .artist
        .clone()
        .or_else(|| top_artists_all.first().map(|a| a.artist.clone()));

    Summary {
        top_songs: top_songs(rows, 10),
        song_trend: song_trend(rows, 5),
        top_artists_per_month: top_artists_per_month(rows, 3),
        monthly_top: monthly_top(rows, &opts.months, opts.subject, 5),
        weekly_heatmap: weekly_heatmap(rows),
        artist_profile: profile_artist.and_then(|a| artist_profile(rows, &a)),
        platform_daily: platform_daily(rows),
        facts: listening_facts(rows),
        top_artists: top_artists_all,
    }
}
