// src/error.rs
//! Error taxonomy of the ingest pipeline.
//!
//! Only failures that remove a whole platform from a run are errors here.
//! Row-level misses (one play without a timestamp, a YouTube entry with no
//! artist) are counted on `NormalizeStats` instead, and an empty merge is a
//! `MergeOutcome::Empty`, never an `Err`.

use thiserror::Error;

use crate::ingest::types::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The upload could not be decoded as the expected format at all.
    #[error("Could not read the {} file: {reason}.", .platform.label())]
    Decode { platform: Platform, reason: String },

    /// A required column/field is missing from the whole file.
    #[error(
        "The {} file has no \"{field}\" field. Is this the right export file?",
        .platform.label()
    )]
    Schema { platform: Platform, field: String },
}

impl IngestError {
    pub fn platform(&self) -> Platform {
        match self {
            IngestError::Decode { platform, .. } | IngestError::Schema { platform, .. } => {
                *platform
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform \"{0}\" (expected spotify, youtube or apple)")]
pub struct UnknownPlatform(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_plain_sentences() {
        let e = IngestError::Schema {
            platform: Platform::Apple,
            field: "Event End Timestamp".into(),
        };
        assert_eq!(
            e.to_string(),
            "The Apple Music file has no \"Event End Timestamp\" field. \
             Is this the right export file?"
        );
        assert_eq!(e.platform(), Platform::Apple);

        let d = IngestError::Decode {
            platform: Platform::Youtube,
            reason: "the file is not valid JSON".into(),
        };
        assert!(d.to_string().starts_with("Could not read the YouTube Music file"));
    }
}
