// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::ingest::config::PipelineConfig;
use crate::ingest::merge::MergeOutcome;
use crate::ingest::types::{Platform, YearSet};
use crate::ingest::{Pipeline, PipelineRun, PlatformReport, Uploads};
use crate::summary::{summarize, Summary, SummaryOptions};

/// Exports are whole listening histories; the axum default of 2 MB is too small.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<PipelineConfig>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::from_config(&config)),
            config: Arc::new(config),
        }
    }
}

pub fn create_router(config: PipelineConfig) -> Router {
    router(AppState::new(config))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ingest", post(ingest))
        .route("/summary", post(summary))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// File fields hold the raw export contents.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IngestReq {
    pub spotify: Option<String>,
    pub youtube: Option<String>,
    pub apple: Option<String>,
    pub years: Option<Vec<i32>>,
    pub platforms: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryReq {
    #[serde(flatten)]
    pub ingest: IngestReq,
    #[serde(flatten)]
    pub options: SummaryOptions,
}

#[derive(Debug, Serialize)]
pub struct IngestResp {
    pub platforms: Vec<PlatformReport>,
    pub selected: Vec<Platform>,
    #[serde(flatten)]
    pub result: MergeOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SummaryResp {
    Ok {
        platforms: Vec<PlatformReport>,
        summary: Summary,
    },
    Empty {
        platforms: Vec<PlatformReport>,
        reason: String,
    },
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ApiError { error: msg.into() })).into_response()
}

impl IngestReq {
    fn uploads(&self) -> Uploads {
        let mut uploads = Uploads::new();
        for (platform, body) in [
            (Platform::Spotify, &self.spotify),
            (Platform::Youtube, &self.youtube),
            (Platform::Apple, &self.apple),
        ] {
            if let Some(body) = body {
                uploads.insert(platform, body.as_bytes());
            }
        }
        uploads
    }

    fn years(&self, cfg: &PipelineConfig) -> YearSet {
        match &self.years {
            Some(ys) => ys.iter().copied().collect(),
            None => cfg.default_years(),
        }
    }

    fn platforms(&self) -> Result<Option<Vec<Platform>>, Response> {
        let Some(names) = &self.platforms else {
            return Ok(None);
        };
        names
            .iter()
            .map(|n| n.parse::<Platform>())
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
    }
}

async fn run_pipeline(state: &AppState, req: &IngestReq) -> Result<PipelineRun, Response> {
    let uploads = req.uploads();
    if uploads.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Upload at least one file.",
        ));
    }
    let requested = req.platforms()?;
    let years = req.years(&state.config);

    let pipeline = state.pipeline.clone();
    let joined = tokio::task::spawn_blocking(move || {
        pipeline.run(&uploads, &years, requested.as_deref())
    })
    .await;

    joined.map_err(|e| {
        tracing::error!(target: "api", error = ?e, "pipeline task failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "pipeline task failed")
    })
}

async fn ingest(State(state): State<AppState>, Json(req): Json<IngestReq>) -> Response {
    match run_pipeline(&state, &req).await {
        Ok(run) => {
            tracing::info!(target: "api", rows = run.result.rows().len(), "ingest served");
            Json(IngestResp {
                platforms: run.platforms,
                selected: run.selected,
                result: run.result,
            })
            .into_response()
        }
        Err(resp) => resp,
    }
}

async fn summary(State(state): State<AppState>, Json(req): Json<SummaryReq>) -> Response {
    let run = match run_pipeline(&state, &req.ingest).await {
        Ok(run) => run,
        Err(resp) => return resp,
    };

    let body = match run.result {
        MergeOutcome::Ok { rows } => SummaryResp::Ok {
            platforms: run.platforms,
            summary: summarize(&rows, &req.options),
        },
        MergeOutcome::Empty { reason } => SummaryResp::Empty {
            platforms: run.platforms,
            reason,
        },
    };
    Json(body).into_response()
}
