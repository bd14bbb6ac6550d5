// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ingest::types::YearSet;

pub const ENV_CONFIG_PATH: &str = "LISTND_CONFIG_PATH";

/// Knobs of the normalization pipeline. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Years used when a request does not name any.
    pub years: Vec<i32>,
    /// `header` value of YouTube Music entries in the Takeout history.
    pub youtube_header: String,
    pub watched_prefix: String,
    /// Suffix of auto-generated artist channels.
    pub topic_suffix: String,
    /// Phrases removed (case-insensitively) from YouTube titles, in order.
    pub title_boilerplate: Vec<String>,
    pub apple_content_type: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            years: vec![2024],
            youtube_header: "YouTube Music".to_string(),
            watched_prefix: "Watched ".to_string(),
            topic_suffix: " - Topic".to_string(),
            title_boilerplate: [
                "(Un-Official Video)",
                "(Official Video)",
                "(lyrics)",
                "-",
                "(Official)",
                "(Audio)",
                "(Official Music Video)",
                "(feat. )",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            apple_content_type: "Song".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn default_years(&self) -> YearSet {
        self.years.iter().copied().collect()
    }

    fn sanitized(mut self) -> Self {
        self.years.sort_unstable();
        self.years.dedup();
        // phrases are matched verbatim; only blank entries are dropped
        self.title_boilerplate.retain(|p| !p.trim().is_empty());
        self.youtube_header = self.youtube_header.trim().to_string();
        self.apple_content_type = self.apple_content_type.trim().to_string();
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $LISTND_CONFIG_PATH
/// 2) config/listnd.toml
/// 3) config/listnd.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<PipelineConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            info!(target: "config", path = %pb.display(), "pipeline config from env path");
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    for candidate in ["config/listnd.toml", "config/listnd.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            info!(target: "config", path = candidate, "pipeline config loaded");
            return load_config_from(&p);
        }
    }
    info!(target: "config", "no pipeline config file, using defaults");
    Ok(PipelineConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<PipelineConfig> {
    // extension first, then a leading brace means JSON
    let looks_json = s.trim_start().starts_with('{');
    if hint_ext == "toml" || (!looks_json && hint_ext != "json") {
        return parse_toml(s);
    }
    parse_json(s)
}

fn parse_toml(s: &str) -> Result<PipelineConfig> {
    let cfg: PipelineConfig = toml::from_str(s).context("parsing TOML pipeline config")?;
    Ok(cfg.sanitized())
}

fn parse_json(s: &str) -> Result<PipelineConfig> {
    let cfg: PipelineConfig = serde_json::from_str(s).context("parsing JSON pipeline config")?;
    Ok(cfg.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_files_keep_defaults() {
        let toml = r#"
years = [2025, 2023, 2025]
title_boilerplate = ["(Live)", "  ", "-"]
"#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.years, vec![2023, 2025]);
        assert_eq!(cfg.title_boilerplate, vec!["(Live)".to_string(), "-".to_string()]);
        assert_eq!(cfg.topic_suffix, " - Topic");

        let json = r#"{"apple_content_type": " Song "}"#;
        let cfg = parse_json(json).unwrap();
        assert_eq!(cfg.apple_content_type, "Song");
        assert_eq!(cfg.years, vec![2024]);
    }

    #[test]
    fn format_is_picked_by_extension_then_content() {
        assert!(parse_config(r#"{"years":[2022]}"#, "").is_ok());
        assert!(parse_config("years = [2022]", "").is_ok());
        assert!(parse_config("years = [2022]", "json").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_CONFIG_PATH);

        // nothing on disk → defaults
        let v = load_config_default().unwrap();
        assert_eq!(v, PipelineConfig::default());

        // env wins
        let p_json = tmp.path().join("listnd.json");
        fs::write(&p_json, r#"{"years":[2021]}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_json.display().to_string());
        let v2 = load_config_default().unwrap();
        assert_eq!(v2.years, vec![2021]);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(load_config_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
