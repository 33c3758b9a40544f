//! Configuration types for the preparation pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PrepError;
use crate::split::DatasetSplitter;

/// Where the two source tables live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_car_info")]
    pub car_info: PathBuf,

    #[serde(default = "default_dyno_runs")]
    pub dyno_runs: PathBuf,

    /// Cut concatenated reading rows back into columns while loading.
    #[serde(default)]
    pub repair_concatenated: bool,
}

fn default_car_info() -> PathBuf {
    PathBuf::from("car_info.csv")
}

fn default_dyno_runs() -> PathBuf {
    PathBuf::from("dyno_runs.csv")
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            car_info: default_car_info(),
            dyno_runs: default_dyno_runs(),
            repair_concatenated: false,
        }
    }
}

/// Spec-text feature mining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Words reported by the unmatched-keyword diagnostic.
    #[serde(default = "default_top_words")]
    pub top_words: usize,
}

fn default_true() -> bool {
    true
}

fn default_top_words() -> usize {
    25
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_words: default_top_words(),
        }
    }
}

/// Train / validate / test fractions and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Share of all runs held out as test.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Share of the remaining runs used for validation.
    #[serde(default = "default_validate_fraction")]
    pub validate_fraction: f64,
}

fn default_seed() -> u64 {
    1
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_validate_fraction() -> f64 {
    0.375
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            validate_fraction: default_validate_fraction(),
        }
    }
}

impl SplitConfig {
    pub fn splitter(&self) -> DatasetSplitter {
        DatasetSplitter {
            seed: self.seed,
            test_fraction: self.test_fraction,
            validate_fraction: self.validate_fraction,
        }
    }
}

/// How to treat runs that lose every reading during cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Drop car records whose run has no surviving reading before splitting.
    #[serde(default)]
    pub drop_runs_without_readings: bool,
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PrepError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: PipelineConfig =
            toml::from_str(content).map_err(|e| PrepError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
