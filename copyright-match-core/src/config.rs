//! Explicit, immutable run configuration.
//!
//! Modeled on `evergreen::conf::ConfigBuilder`: parse a TOML file into
//! a builder, layer it over compiled-in defaults, then `build()` into
//! an immutable [`Config`] that is constructed once and shared by
//! reference (`Arc<Config>`) with every worker. There is no
//! process-wide mutable config singleton.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MatchError, Result};

/// Similarity and gating thresholds (§6 Configuration surface).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub title: f64,
    pub author: f64,
    pub publisher: f64,
    pub early_exit_title: f64,
    pub early_exit_author: f64,
    pub early_exit_publisher: f64,
    pub year_tolerance: i32,
    pub minimum_combined_score: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            title: 40.0,
            author: 40.0,
            publisher: 30.0,
            early_exit_title: 95.0,
            early_exit_author: 90.0,
            early_exit_publisher: 90.0,
            year_tolerance: 1,
            minimum_combined_score: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YearFilters {
    pub min_year: i32,
    pub max_year: i32,
    pub brute_force_missing_year: bool,
}

impl Default for YearFilters {
    fn default() -> Self {
        YearFilters {
            min_year: 1500,
            max_year: 2100,
            brute_force_missing_year: false,
        }
    }
}

/// The four scoring scenarios named in §4.8, selected by whether the
/// title is generic and whether publisher data is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringScenario {
    NormalWithPublisher,
    GenericWithPublisher,
    NormalNoPublisher,
    GenericNoPublisher,
}

impl ScoringScenario {
    pub fn select(has_generic_title: bool, publisher_present: bool) -> Self {
        match (has_generic_title, publisher_present) {
            (false, true) => ScoringScenario::NormalWithPublisher,
            (true, true) => ScoringScenario::GenericWithPublisher,
            (false, false) => ScoringScenario::NormalNoPublisher,
            (true, false) => ScoringScenario::GenericNoPublisher,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ScoringScenario::NormalWithPublisher => "normal_with_publisher",
            ScoringScenario::GenericWithPublisher => "generic_with_publisher",
            ScoringScenario::NormalNoPublisher => "normal_no_publisher",
            ScoringScenario::GenericNoPublisher => "generic_no_publisher",
        }
    }
}

/// Weight given to each field within a scenario; must sum to 1.0 as
/// shipped, though redistribution (§4.8) may alter the effective
/// weights at combine-time for a specific record.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoringWeights {
    pub title: f64,
    pub author: f64,
    pub publisher: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: HashMap<String, ScoringWeights>,
    pub lccn_floor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut weights = HashMap::new();
        weights.insert(
            ScoringScenario::NormalWithPublisher.key().to_string(),
            ScoringWeights { title: 0.5, author: 0.3, publisher: 0.2 },
        );
        weights.insert(
            ScoringScenario::GenericWithPublisher.key().to_string(),
            ScoringWeights { title: 0.2, author: 0.45, publisher: 0.35 },
        );
        weights.insert(
            ScoringScenario::NormalNoPublisher.key().to_string(),
            ScoringWeights { title: 0.65, author: 0.35, publisher: 0.0 },
        );
        weights.insert(
            ScoringScenario::GenericNoPublisher.key().to_string(),
            ScoringWeights { title: 0.3, author: 0.7, publisher: 0.0 },
        );
        ScoringConfig { weights, lccn_floor: 95.0 }
    }
}

impl ScoringConfig {
    pub fn weights_for(&self, scenario: ScoringScenario) -> ScoringWeights {
        self.weights
            .get(scenario.key())
            .copied()
            .unwrap_or(ScoringWeights { title: 1.0, author: 0.0, publisher: 0.0 })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenericTitleConfig {
    pub frequency_threshold: u32,
    pub cache_size: usize,
    pub max_title_counts: usize,
}

impl Default for GenericTitleConfig {
    fn default() -> Self {
        GenericTitleConfig {
            frequency_threshold: 10,
            cache_size: 4096,
            max_title_counts: 50_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub batch_size: usize,
    pub max_workers: Option<usize>,
    pub streaming_mode: bool,
    pub temp_dir: PathBuf,
    pub memory_check_interval_secs: u64,
    pub memory_warning_threshold_gb: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            batch_size: 200,
            max_workers: None,
            streaming_mode: false,
            temp_dir: std::env::temp_dir(),
            memory_check_interval_secs: 30,
            memory_warning_threshold_gb: 8.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub force_refresh: bool,
    pub disable_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            cache_dir: PathBuf::from(".copyright-match-cache"),
            force_refresh: false,
            disable_cache: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Xlsx,
    Html,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub formats: Vec<OutputFormat>,
    pub single_file: bool,
    pub output_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            formats: vec![OutputFormat::Csv],
            single_file: true,
            output_path: PathBuf::from("results.csv"),
        }
    }
}

/// Year-threshold configuration consulted by status classification
/// (§4.11). Distinct from [`YearFilters`] (which bounds corpus
/// ingestion) — these are the legal cutoffs the status decision table
/// uses.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    /// Works published strictly before this year are public domain
    /// regardless of match outcome (e.g. 1929 under the rolling
    /// 95-year U.S. term as of this writing).
    pub pd_cutoff_year: i32,
    /// Renewal was only required for works published in this window;
    /// outside it, a missing renewal match is not dispositive.
    pub renewal_required_from: i32,
    pub renewal_required_until: i32,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        StatusThresholds {
            pd_cutoff_year: 1929,
            renewal_required_from: 1929,
            renewal_required_until: 1963,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisModes {
    pub us_only: bool,
    pub score_everything: bool,
    pub ground_truth_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Wordlists {
    pub mojibake_map: HashMap<String, String>,
    pub stopwords: HashMap<String, Vec<String>>,
    pub author_stopwords: HashMap<String, Vec<String>>,
    pub publisher_stopwords: Vec<String>,
    pub publisher_suffix_pattern: String,
    pub abbreviations: HashMap<String, String>,
    pub generic_title_patterns: Vec<String>,
}

const EMBEDDED_WORDLISTS: &str = include_str!("../resources/wordlists.json");

impl Wordlists {
    pub fn embedded() -> Result<Wordlists> {
        Ok(serde_json::from_str(EMBEDDED_WORDLISTS)?)
    }
}

/// The full, immutable run configuration. Built once via
/// [`ConfigBuilder`] and shared by reference thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: Thresholds,
    pub year_filters: YearFilters,
    pub scoring: ScoringConfig,
    pub generic_title: GenericTitleConfig,
    pub wordlists: Wordlists,
    pub processing: ProcessingConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
    pub analysis: AnalysisModes,
    pub status_thresholds: StatusThresholds,
}

/// Partial configuration as read from a TOML file; any field left out
/// falls back to the compiled-in default when the builder runs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    thresholds: Option<Thresholds>,
    year_filters: Option<YearFilters>,
    scoring: Option<ScoringConfig>,
    generic_title: Option<GenericTitleConfig>,
    processing: Option<ProcessingConfig>,
    cache: Option<CacheConfig>,
    output: Option<OutputConfig>,
    analysis: Option<AnalysisModes>,
    status_thresholds: Option<StatusThresholds>,
}

pub struct ConfigBuilder {
    file: ConfigFile,
}

impl ConfigBuilder {
    /// Start from compiled-in defaults with no file overrides.
    pub fn new() -> Self {
        ConfigBuilder { file: ConfigFile::default() }
    }

    /// Parse a TOML configuration file, layering its values over the
    /// compiled-in defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            MatchError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        let file: ConfigFile = toml::from_str(&text)
            .map_err(|e| MatchError::Config(format!("invalid config TOML: {e}")))?;
        Ok(ConfigBuilder { file })
    }

    pub fn build(self) -> Result<Config> {
        let config = Config {
            thresholds: self.file.thresholds.unwrap_or_default(),
            year_filters: self.file.year_filters.unwrap_or_default(),
            scoring: self.file.scoring.unwrap_or_default(),
            generic_title: self.file.generic_title.unwrap_or_default(),
            wordlists: Wordlists::embedded()?,
            processing: self.file.processing.unwrap_or_default(),
            cache: self.file.cache.unwrap_or_default(),
            output: self.file.output.unwrap_or_default(),
            analysis: self.file.analysis.unwrap_or_default(),
            status_thresholds: self.file.status_thresholds.unwrap_or_default(),
        };

        if config.year_filters.max_year < config.year_filters.min_year {
            return Err(MatchError::Config(format!(
                "max_year ({}) is less than min_year ({})",
                config.year_filters.max_year, config.year_filters.min_year
            )));
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Build the default configuration with no file overrides.
    pub fn default_config() -> Result<Config> {
        ConfigBuilder::new().build()
    }

    /// Load a configuration file, falling back to compiled-in defaults
    /// for any field it does not specify.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        ConfigBuilder::from_file(path)?.build()
    }

    pub fn worker_count(&self) -> usize {
        self.processing
            .max_workers
            .unwrap_or_else(|| num_cpus::get().saturating_sub(2).max(1))
    }
}
