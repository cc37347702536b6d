//! Project configuration: `tether.toml` plus environment overrides

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tether_indexer::{CoordinatorOptions, DEFAULT_MARKUP_EXTENSIONS};

/// Configuration file name, looked up at the project root
pub const CONFIG_FILE: &str = "tether.toml";

const ENV_EXPORT_GLOB: &str = "TETHER_EXPORT_GLOB";
const ENV_MARKUP_EXTENSIONS: &str = "TETHER_MARKUP_EXTENSIONS";
const ENV_WORKERS: &str = "TETHER_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob selecting symbol export files, relative to the root
    pub export_glob: String,

    /// Extensions of markup files that compile to generated code
    pub markup_extensions: Vec<String>,

    /// Worker threads for graph builds (host parallelism when unset)
    pub workers: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            export_glob: "**/*.symbols.json".to_string(),
            markup_extensions: DEFAULT_MARKUP_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            workers: None,
        }
    }
}

impl Config {
    /// Load `<root>/tether.toml` (defaults when absent), then apply
    /// environment overrides, including those from `<root>/.env`.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            Config::default()
        };

        if dotenvy::from_path(root.join(".env")).is_ok() {
            tracing::debug!("Loaded environment from {}", root.join(".env").display());
        }
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(glob) = lookup(ENV_EXPORT_GLOB) {
            self.export_glob = glob;
        }
        if let Some(extensions) = lookup(ENV_MARKUP_EXTENSIONS) {
            self.markup_extensions = extensions
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            let workers: usize = workers
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WORKERS} must be a positive integer, got {workers:?}"))?;
            self.workers = (workers > 0).then_some(workers);
        }
        Ok(())
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            markup_extensions: self.markup_extensions.clone(),
            workers: self.workers,
        }
    }
}
