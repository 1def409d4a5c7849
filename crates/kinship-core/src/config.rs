//! Engine configuration loaded from an optional TOML file.
//!
//! Every field has a serde default so a missing or partial file still yields
//! a usable config. Detection bounds exist to keep worst-case traversal cost
//! predictable on very large families.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub terms: TermConfig,
}

/// Bounds for the relationship detection traversal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum number of members the BFS may visit before giving up with
    /// a `GraphTooLarge` outcome.
    #[serde(default = "default_max_visited")]
    pub max_visited: usize,
    /// Maximum path length (in hops) the BFS will explore.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_visited: default_max_visited(),
            max_depth: default_max_depth(),
        }
    }
}

/// Rendering options for the kinship term table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TermConfig {
    /// Qualify collateral terms with lineage side ("paternal uncle" vs
    /// plain "uncle").
    #[serde(default = "default_true")]
    pub side_qualified: bool,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            side_qualified: default_true(),
        }
    }
}

const fn default_max_visited() -> usize {
    5000
}

const fn default_max_depth() -> usize {
    25
}

const fn default_true() -> bool {
    true
}

/// Load the engine config from `path`.
///
/// A missing file is not an error — defaults are returned. A present but
/// malformed file is an error (silent fallback would hide typos).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))?;
    Ok(config)
}
