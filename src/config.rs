use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analytics::{
    AnalyticsSettings, DEFAULT_PASS_THRESHOLD, DEFAULT_STREAM_TOP_N, DEFAULT_SUBJECT_TOP_N,
};
use crate::curriculum::Curriculum;

pub const DEFAULT_CONFIG_FILE: &str = "exam-results.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub report: ReportConfig,

    /// Subject lists per stream.
    #[serde(default)]
    pub streams: Curriculum,
}

/// Locations of the results files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Raw results, possibly with duplicate submissions.
    #[serde(default = "default_raw")]
    pub raw: PathBuf,

    /// Deduplicated results read by every query.
    #[serde(default = "default_canonical")]
    pub canonical: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw: default_raw(),
            canonical: default_canonical(),
        }
    }
}

fn default_raw() -> PathBuf {
    PathBuf::from("results.csv")
}

fn default_canonical() -> PathBuf {
    PathBuf::from("results_unique.csv")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Students listed per stream ranking.
    #[serde(default = "default_stream_top_n")]
    pub stream_top_n: usize,

    /// Students listed per subject ranking.
    #[serde(default = "default_subject_top_n")]
    pub subject_top_n: usize,

    /// Lowest passing score.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            stream_top_n: default_stream_top_n(),
            subject_top_n: default_subject_top_n(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

fn default_stream_top_n() -> usize {
    DEFAULT_STREAM_TOP_N
}

fn default_subject_top_n() -> usize {
    DEFAULT_SUBJECT_TOP_N
}

fn default_pass_threshold() -> u32 {
    DEFAULT_PASS_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output: default_output(),
        }
    }
}

fn default_title() -> String {
    "Gedebano School Entrance Exam Results and Analytics".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("exam_report.md")
}

/// Command-line values that override the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub canonical: Option<PathBuf>,
    pub stream_top_n: Option<usize>,
    pub subject_top_n: Option<usize>,
    pub pass_threshold: Option<u32>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Loads `path` when given, else the default file if it exists, else the
    /// built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.analytics.pass_threshold <= 100,
            "pass_threshold must be between 0 and 100, got {}",
            self.analytics.pass_threshold
        );
        self.streams.validate()
    }

    pub fn merge(&mut self, overrides: &Overrides) {
        if let Some(ref canonical) = overrides.canonical {
            self.data.canonical = canonical.clone();
        }
        if let Some(n) = overrides.stream_top_n {
            self.analytics.stream_top_n = n;
        }
        if let Some(n) = overrides.subject_top_n {
            self.analytics.subject_top_n = n;
        }
        if let Some(threshold) = overrides.pass_threshold {
            self.analytics.pass_threshold = threshold;
        }
    }

    pub fn analytics_settings(&self) -> AnalyticsSettings {
        AnalyticsSettings {
            stream_top_n: self.analytics.stream_top_n,
            subject_top_n: self.analytics.subject_top_n,
            pass_threshold: self.analytics.pass_threshold,
        }
    }

    pub fn default_toml() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())
            .context("Failed to render default configuration")?;
        Ok(format!(
            "# exam-results configuration\n# Command-line flags override these values.\n\n{body}"
        ))
    }
}
