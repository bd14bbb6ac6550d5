// src/ingest/mod.rs
pub mod config;
pub mod merge;
pub mod providers;
pub mod reader;
pub mod reconcile;
pub mod timestamp;
pub mod types;

use std::collections::BTreeMap;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::ingest::config::PipelineConfig;
use crate::ingest::merge::{merge, MergeOutcome, PlatformEvents, REASON_NO_UPLOADS};
use crate::ingest::providers::{AppleNormalizer, SpotifyNormalizer, YoutubeNormalizer};
use crate::ingest::types::{NormalizeStats, Platform, PlatformNormalizer, YearSet};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("listnd_rows_read_total", "Records decoded from uploads.");
        describe_counter!(
            "listnd_rows_dropped_total",
            "Records dropped for missing fields, bad timestamps or no artist."
        );
        describe_counter!("listnd_events_total", "Listen events produced.");
        describe_counter!(
            "listnd_platform_errors_total",
            "Uploads rejected as undecodable or missing a required field."
        );
        describe_counter!(
            "listnd_artists_unresolved_total",
            "YouTube listens left attributed to the uploader channel."
        );
        describe_histogram!("listnd_parse_ms", "Per-platform normalization time in milliseconds.");
        describe_gauge!(
            "listnd_pipeline_last_run_ts",
            "Unix ts when the pipeline last ran."
        );
    });
}

/// Raw export files supplied for one run, keyed by platform.
#[derive(Debug, Clone, Default)]
pub struct Uploads(BTreeMap<Platform, Vec<u8>>);

impl Uploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, platform: Platform, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(platform, bytes);
        self
    }

    pub fn insert(&mut self, platform: Platform, bytes: impl Into<Vec<u8>>) {
        self.0.insert(platform, bytes.into());
    }

    pub fn get(&self, platform: Platform) -> Option<&[u8]> {
        self.0.get(&platform).map(Vec::as_slice)
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformStatus {
    Normalized(NormalizeStats),
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformReport {
    pub platform: Platform,
    #[serde(flatten)]
    pub status: PlatformStatus,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRun {
    /// One report per selected upload, in platform order.
    pub platforms: Vec<PlatformReport>,
    /// Platforms that were actually merged.
    pub selected: Vec<Platform>,
    pub result: MergeOutcome,
}

/// read → normalize (+ reconcile) → merge, with failures isolated per platform.
pub struct Pipeline {
    normalizers: Vec<Box<dyn PlatformNormalizer>>,
}

impl Pipeline {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::with_normalizers(vec![
            Box::new(SpotifyNormalizer),
            Box::new(YoutubeNormalizer::from_config(cfg)),
            Box::new(AppleNormalizer::from_config(cfg)),
        ])
    }

    pub fn with_normalizers(normalizers: Vec<Box<dyn PlatformNormalizer>>) -> Self {
        Self { normalizers }
    }

    fn normalizer(&self, platform: Platform) -> Option<&dyn PlatformNormalizer> {
        self.normalizers
            .iter()
            .find(|n| n.platform() == platform)
            .map(|n| n.as_ref())
    }

    /// Normalize the uploads of `selected`. A failing platform is reported
    /// and left out of the returned events; the others are unaffected.
    pub fn normalize_all(
        &self,
        uploads: &Uploads,
        years: &YearSet,
        selected: &[Platform],
    ) -> (PlatformEvents, Vec<PlatformReport>) {
        ensure_metrics_described();

        let mut events = PlatformEvents::default();
        let mut reports = Vec::new();
        for &platform in selected {
            let (Some(raw), Some(normalizer)) = (uploads.get(platform), self.normalizer(platform))
            else {
                continue;
            };

            let t0 = std::time::Instant::now();
            let result = normalizer.normalize(raw, years);
            let ms = t0.elapsed().as_secs_f64() * 1_000.0;
            histogram!("listnd_parse_ms", "platform" => platform.as_str()).record(ms);

            let status = match result {
                Ok(out) => {
                    record_stats(platform, &out.stats);
                    tracing::info!(
                        target: "ingest",
                        %platform,
                        rows = out.stats.rows_read,
                        events = out.stats.events,
                        dropped = out.stats.rows_dropped,
                        "platform normalized"
                    );
                    let stats = out.stats;
                    events.insert(platform, out.events);
                    PlatformStatus::Normalized(stats)
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, %platform, "platform rejected");
                    counter!("listnd_platform_errors_total", "platform" => platform.as_str())
                        .increment(1);
                    PlatformStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            reports.push(PlatformReport { platform, status });
        }

        (events, reports)
    }

    /// Run the whole pipeline once.
    ///
    /// `requested = None` selects every supplied platform. Requested platforms
    /// without an upload are ignored; unselected uploads are not read at all.
    /// A non-empty request that matches no upload is reported as "no data"
    /// rather than "no platforms selected".
    pub fn run(
        &self,
        uploads: &Uploads,
        years: &YearSet,
        requested: Option<&[Platform]>,
    ) -> PipelineRun {
        let selected = resolve_selection(uploads, requested);
        let (events, platforms) = self.normalize_all(uploads, years, &selected);
        let nothing_uploaded = selected.is_empty() && requested.is_some_and(|r| !r.is_empty());
        let result = if nothing_uploaded {
            MergeOutcome::Empty {
                reason: REASON_NO_UPLOADS.to_string(),
            }
        } else {
            merge(&events, &selected)
        };

        let now = chrono::Utc::now().timestamp().max(0);
        gauge!("listnd_pipeline_last_run_ts").set(now as f64);
        if let MergeOutcome::Empty { reason } = &result {
            tracing::info!(target: "ingest", %reason, "pipeline produced no rows");
        }

        PipelineRun {
            platforms,
            selected,
            result,
        }
    }
}

fn record_stats(platform: Platform, stats: &NormalizeStats) {
    let p = platform.as_str();
    counter!("listnd_rows_read_total", "platform" => p).increment(stats.rows_read as u64);
    counter!("listnd_rows_dropped_total", "platform" => p).increment(stats.rows_dropped as u64);
    counter!("listnd_events_total", "platform" => p).increment(stats.events as u64);
    if stats.unresolved_artists > 0 {
        counter!("listnd_artists_unresolved_total").increment(stats.unresolved_artists as u64);
    }
}

/// Selected platforms, constrained to those with an upload, in platform order.
pub fn resolve_selection(uploads: &Uploads, requested: Option<&[Platform]>) -> Vec<Platform> {
    let supplied: Vec<Platform> = uploads.platforms().collect();
    let Some(requested) = requested else {
        return supplied;
    };
    for p in requested {
        if !supplied.contains(p) {
            tracing::warn!(
                target: "ingest",
                platform = %p,
                "selected platform has no upload; ignored"
            );
        }
    }
    Platform::ALL
        .into_iter()
        .filter(|p| requested.contains(p) && supplied.contains(p))
        .collect()
}

/// Convenience wrapper: default config, every supplied platform selected.
pub fn run_once(uploads: &Uploads, years: &YearSet) -> PipelineRun {
    Pipeline::from_config(&PipelineConfig::default()).run(uploads, years, None)
}
