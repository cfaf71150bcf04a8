use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine parameters. Plain values: loading them from a file is the caller's
/// business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub corpus_root: PathBuf,
    /// Where the fingerprint manifest is persisted. `None` keeps it in memory.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: usize,
    #[serde(default = "default_min_score")]
    pub default_min_score: f32,
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_refresh_interval_secs() -> u64 {
    300
}
fn default_max_tokens() -> usize {
    4000
}
fn default_min_score() -> f32 {
    0.0
}
fn default_max_include_depth() -> usize {
    16
}
fn default_extensions() -> Vec<String> {
    ["md", "mdc", "markdown", "txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl EngineConfig {
    pub fn new(corpus_root: impl Into<PathBuf>) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            snapshot_path: None,
            refresh_interval_secs: default_refresh_interval_secs(),
            default_max_tokens: default_max_tokens(),
            default_min_score: default_min_score(),
            max_include_depth: default_max_include_depth(),
            extensions: default_extensions(),
        }
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "corpus_root": "memory-bank" }"#).unwrap();
        assert_eq!(config, EngineConfig::new("memory-bank"));
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
        assert_eq!(config.default_max_tokens, 4000);
    }
}
