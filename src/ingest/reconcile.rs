// src/ingest/reconcile.rs
//! Title/artist reconciliation for YouTube Music history.
//!
//! YouTube encodes the artist either as an auto-generated "<Artist> - Topic"
//! channel (reliable) or as whatever channel uploaded the video (unreliable;
//! the real artist is usually somewhere in the title). Reconciliation runs in
//! two passes:
//!
//! 1. [`Reconciler::build`] collects every Topic-channel artist into an
//!    immutable [`TrustedArtists`] set, ordered longest name first.
//! 2. [`Reconciler::reconcile`] maps one record against that set: Topic
//!    records keep their stripped channel name, the rest take the first
//!    trusted name found in the title, and every title is cleaned.
//!
//! Matching is case-insensitive substring matching. Names of equal length
//! keep the order in which they were first seen in the history.

use regex::Regex;
use tracing::debug;

/// A trusted name (or boilerplate phrase) with its case-insensitive matcher.
#[derive(Debug, Clone)]
struct Literal {
    text: String,
    re: Regex,
}

impl Literal {
    fn new(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let re = Regex::new(&format!("(?i){}", regex::escape(text))).ok()?;
        Some(Self {
            text: text.to_string(),
            re,
        })
    }
}

/// Strip the Topic marker. Returns the artist and whether it came from a Topic channel.
pub fn split_topic<'a>(channel: &'a str, topic_suffix: &str) -> (&'a str, bool) {
    if topic_suffix.is_empty() {
        return (channel.trim(), false);
    }
    match channel.strip_suffix(topic_suffix) {
        Some(name) => (name.trim(), true),
        None => (channel.trim(), false),
    }
}

/// Distinct artist names taken from Topic channels, longest first.
#[derive(Debug, Clone, Default)]
pub struct TrustedArtists {
    names: Vec<Literal>,
}

impl TrustedArtists {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<Literal> = Vec::new();
        for n in names {
            let n = n.as_ref();
            if seen.iter().any(|l| l.text == n) {
                continue;
            }
            if let Some(lit) = Literal::new(n) {
                seen.push(lit);
            }
        }
        // stable: equal lengths keep first-seen order
        seen.sort_by_key(|l| std::cmp::Reverse(l.text.chars().count()));
        Self { names: seen }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|l| l.text.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|l| l.text == name)
    }

    /// First trusted name (longest first) occurring in `title`.
    pub fn find_in(&self, title: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|l| l.re.is_match(title))
            .map(|l| l.text.as_str())
    }

    fn strip_from(&self, title: &str) -> String {
        let mut out = title.to_string();
        for l in &self.names {
            if l.re.is_match(&out) {
                out = l.re.replace_all(&out, "").into_owned();
            }
        }
        out
    }
}

/// One YouTube record as it reaches reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisional {
    /// First subtitle name: a channel, possibly "<Artist> - Topic".
    pub channel: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub artist: String,
    pub title: String,
    /// The artist came from a Topic channel.
    pub high_confidence: bool,
    /// Low confidence and no trusted name in the title; `artist` is the uploader channel.
    pub unresolved: bool,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    topic_suffix: String,
    trusted: TrustedArtists,
    boilerplate: Vec<Literal>,
}

impl Reconciler {
    /// Pass 1: build the trusted-artist set from the whole history.
    pub fn build<'a, I>(records: I, topic_suffix: &str, boilerplate: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Provisional>,
    {
        let trusted = TrustedArtists::new(records.into_iter().filter_map(|r| {
            match split_topic(&r.channel, topic_suffix) {
                (name, true) => Some(name.to_string()),
                _ => None,
            }
        }));
        debug!(target: "reconcile", trusted = trusted.len(), "trusted artist set built");
        Self::with_trusted(trusted, topic_suffix, boilerplate)
    }

    pub fn with_trusted(
        trusted: TrustedArtists,
        topic_suffix: &str,
        boilerplate: &[String],
    ) -> Self {
        Self {
            topic_suffix: topic_suffix.to_string(),
            trusted,
            boilerplate: boilerplate.iter().filter_map(|p| Literal::new(p)).collect(),
        }
    }

    pub fn trusted(&self) -> &TrustedArtists {
        &self.trusted
    }

    /// Pass 2: settle artist and title for one record.
    pub fn reconcile(&self, record: &Provisional) -> Reconciled {
        let (channel_artist, high_confidence) = split_topic(&record.channel, &self.topic_suffix);

        let (artist, unresolved) = if high_confidence {
            (channel_artist.to_string(), false)
        } else {
            match self.trusted.find_in(&record.title) {
                Some(name) => (name.to_string(), false),
                None => (channel_artist.to_string(), true),
            }
        };

        let title = self.clean_title(&record.title, &artist);
        Reconciled {
            artist,
            title,
            high_confidence,
            unresolved,
        }
    }

    /// Remove trusted names, the record's own artist and boilerplate, then trim.
    ///
    /// Repeats until nothing changes, so the result is a fixed point: cleaning
    /// it again is a no-op and it never contains `own_artist`.
    pub fn clean_title(&self, title: &str, own_artist: &str) -> String {
        let own = if self.trusted.contains(own_artist) {
            None
        } else {
            Literal::new(own_artist.trim())
        };

        let mut current = title.to_string();
        loop {
            let next = self.clean_once(&current, own.as_ref());
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn clean_once(&self, title: &str, own: Option<&Literal>) -> String {
        let mut out = self.trusted.strip_from(title);
        if let Some(own) = own {
            out = own.re.replace_all(&out, "").into_owned();
        }
        for phrase in &self.boilerplate {
            out = phrase.re.replace_all(&out, "").into_owned();
        }
        out.trim().to_string()
    }
}
