//! Analysis configuration, read from TOML or YAML.
//!
//! ```toml
//! genome = "genome.fa"
//! min_segment_length = 20
//! threads = 4
//!
//! [[datasets]]
//! id = "h3k4me3"
//! path = "h3k4me3.bed"
//!
//! [[motifs]]
//! id = "ebox"
//! pattern = "CANNTG"
//! ```
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SegcodeError};
use crate::models::{MotifMode, PwmAggregate};

/// Codes are `u32` bitmasks.
pub const MAX_DATASETS: usize = 31;

pub const DEFAULT_PSEUDOCOUNT: f64 = 0.01;

fn default_min_segment_length() -> u32 {
    1
}

fn default_pseudocount() -> f64 {
    DEFAULT_PSEUDOCOUNT
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    pub id: String,
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub use_score: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AdditionalConfig {
    pub id: String,
    pub name: Option<String>,
    pub path: PathBuf,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MotifConfig {
    pub id: String,
    pub name: Option<String>,
    pub pattern: String,
    #[serde(default)]
    pub mode: MotifMode,
    #[serde(default)]
    pub both_strands: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PwmConfig {
    pub id: String,
    pub name: Option<String>,
    /// JASPAR file; its first matrix is used
    pub path: Option<PathBuf>,
    /// inline `[a, c, g, t]` rows
    pub matrix: Option<Vec<[f64; 4]>>,
    /// rows of `matrix` already hold probabilities
    #[serde(default)]
    pub normalized: bool,
    #[serde(default)]
    pub aggregate: PwmAggregate,
    #[serde(default)]
    pub both_strands: bool,
    #[serde(default = "default_pseudocount")]
    pub pseudocount: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub genome: PathBuf,
    #[serde(default = "default_min_segment_length")]
    pub min_segment_length: u32,
    pub threads: Option<usize>,
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub additional: Vec<AdditionalConfig>,
    #[serde(default)]
    pub motifs: Vec<MotifConfig>,
    #[serde(default)]
    pub pwms: Vec<PwmConfig>,
    /// directory relative paths are resolved against; set when read from disk
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl TryFrom<&Path> for AnalysisConfig {
    type Error = SegcodeError;

    ///
    /// Read a configuration file. The format follows the extension:
    /// `toml`, or `yaml`/`yml`.
    ///
    fn try_from(path: &Path) -> Result<Self> {
        let content = read_to_string(path)?;
        let mut config: AnalysisConfig = match path.extension().and_then(OsStr::to_str) {
            Some("toml") => toml::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(SegcodeError::UnsupportedConfigType(
                    path.display().to_string(),
                ));
            }
        };
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }
}

impl AnalysisConfig {
    /// Number of worker threads, defaulting to the available parallelism.
    pub fn thread_count(&self) -> usize {
        self.threads.filter(|t| *t > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    ///
    /// Reject configurations no run could succeed with.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            return Err(SegcodeError::Config(
                "at least one dataset is required".to_string(),
            ));
        }
        if self.datasets.len() > MAX_DATASETS {
            return Err(SegcodeError::Config(format!(
                "{} datasets given, at most {} are supported",
                self.datasets.len(),
                MAX_DATASETS
            )));
        }
        if self.min_segment_length == 0 {
            return Err(SegcodeError::Config(
                "min_segment_length must be positive".to_string(),
            ));
        }

        let ids = self
            .datasets
            .iter()
            .map(|d| &d.id)
            .chain(self.additional.iter().map(|a| &a.id))
            .chain(self.motifs.iter().map(|m| &m.id))
            .chain(self.pwms.iter().map(|p| &p.id));
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                return Err(SegcodeError::Config(format!("duplicate id '{}'", id)));
            }
        }

        for pwm in &self.pwms {
            if pwm.path.is_none() == pwm.matrix.is_none() {
                return Err(SegcodeError::Config(format!(
                    "pwm '{}' needs exactly one of `path` or `matrix`",
                    pwm.id
                )));
            }
            if pwm.pseudocount < 0.0 {
                return Err(SegcodeError::Config(format!(
                    "pwm '{}' has a negative pseudocount",
                    pwm.id
                )));
            }
        }

        Ok(())
    }
}
