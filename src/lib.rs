// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod api;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod summary;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::error::IngestError;
pub use crate::ingest::merge::{MergeOutcome, MergedRow};
pub use crate::ingest::types::{ListenEvent, Platform, YearSet};
pub use crate::ingest::{Pipeline, PipelineRun, Uploads};
