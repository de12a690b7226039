use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles loading and validating configuration settings.
/// The configuration file is read-only from the tool's point of view.

/// Default configuration file name, looked up in the working directory first
pub const DEFAULT_CONFIG_FILE: &str = "conf.json";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Subtitle layout and timing limits
    #[serde(default)]
    pub subtitle: SubtitleSettings,

    /// Merge heuristics
    #[serde(default)]
    pub tuning: MergeTuning,

    /// Transcription service and chunking settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Subtitle timing and layout limits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleSettings {
    // @field: Shortest time an entry stays on screen (seconds)
    #[serde(default = "default_min_duration")]
    pub min_duration: f64,

    // @field: Longest time an entry stays on screen (seconds)
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,

    // @field: Minimum pause between consecutive entries (seconds)
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,

    // @field: Reading speed ceiling for CJK text
    #[serde(default = "default_cjk_cps")]
    pub cjk_cps: f64,

    // @field: Reading speed ceiling for other scripts
    #[serde(default = "default_latin_cps")]
    pub latin_cps: f64,

    // @field: Line width for CJK text
    #[serde(default = "default_cjk_chars_per_line")]
    pub cjk_chars_per_line: usize,

    // @field: Line width for other scripts
    #[serde(default = "default_latin_chars_per_line")]
    pub latin_chars_per_line: usize,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            min_duration: default_min_duration(),
            max_duration: default_max_duration(),
            min_gap: default_min_gap(),
            cjk_cps: default_cjk_cps(),
            latin_cps: default_latin_cps(),
            cjk_chars_per_line: default_cjk_chars_per_line(),
            latin_chars_per_line: default_latin_chars_per_line(),
        }
    }
}

impl SubtitleSettings {
    /// Line width used for a language
    pub fn chars_per_line(&self, language_code: &str) -> usize {
        if crate::language_utils::is_cjk(language_code) {
            self.cjk_chars_per_line
        } else {
            self.latin_chars_per_line
        }
    }
}

/// Empirical merge heuristics.
///
/// Very short fragments are allowed a higher apparent reading speed: text of at
/// most `tiny_text_chars` visible characters gets `tiny_text_multiplier` times the
/// base limit, and so on down to 1.0 above `medium_text_chars`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MergeTuning {
    #[serde(default = "default_tiny_text_chars")]
    pub tiny_text_chars: usize,

    #[serde(default = "default_tiny_text_multiplier")]
    pub tiny_text_multiplier: f64,

    #[serde(default = "default_short_text_chars")]
    pub short_text_chars: usize,

    #[serde(default = "default_short_text_multiplier")]
    pub short_text_multiplier: f64,

    #[serde(default = "default_medium_text_chars")]
    pub medium_text_chars: usize,

    #[serde(default = "default_medium_text_multiplier")]
    pub medium_text_multiplier: f64,

    /// Merge only when the benefit score is strictly above this
    #[serde(default = "default_benefit_threshold")]
    pub benefit_threshold: f64,

    /// Largest gap (seconds) two entries may have and still be merged
    #[serde(default = "default_max_merge_gap")]
    pub max_merge_gap: f64,

    /// Cap on merged duration, applied together with `max_duration`
    #[serde(default = "default_max_merged_duration")]
    pub max_merged_duration: f64,

    #[serde(default = "default_max_merged_lines")]
    pub max_merged_lines: usize,
}

impl Default for MergeTuning {
    fn default() -> Self {
        Self {
            tiny_text_chars: default_tiny_text_chars(),
            tiny_text_multiplier: default_tiny_text_multiplier(),
            short_text_chars: default_short_text_chars(),
            short_text_multiplier: default_short_text_multiplier(),
            medium_text_chars: default_medium_text_chars(),
            medium_text_multiplier: default_medium_text_multiplier(),
            benefit_threshold: default_benefit_threshold(),
            max_merge_gap: default_max_merge_gap(),
            max_merged_duration: default_max_merged_duration(),
            max_merged_lines: default_max_merged_lines(),
        }
    }
}

/// Transcription service and chunking configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptionConfig {
    /// Speech-to-text endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each upload
    #[serde(default = "default_model")]
    pub model: String,

    /// Language hint; "auto" lets the service detect it
    #[serde(default = "default_language")]
    pub language: String,

    /// Ask the service to annotate non-speech sounds
    #[serde(default = "default_true")]
    pub tag_audio_events: bool,

    /// Inputs longer than this many minutes are split into chunks
    #[serde(default = "default_split_duration_minutes")]
    pub split_duration_minutes: u64,

    /// Process chunks concurrently
    #[serde(default = "default_true")]
    pub concurrent: bool,

    /// Maximum number of chunks in flight
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Total attempts per chunk in the concurrent phase
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Requests per minute across all chunks
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Upload timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            language: default_language(),
            tag_audio_events: true,
            split_duration_minutes: default_split_duration_minutes(),
            concurrent: true,
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    /// Chunk length in seconds
    pub fn split_duration_secs(&self) -> f64 {
        (self.split_duration_minutes * 60) as f64
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_min_duration() -> f64 {
    0.83
}

fn default_max_duration() -> f64 {
    12.0
}

fn default_min_gap() -> f64 {
    0.083
}

fn default_cjk_cps() -> f64 {
    11.0
}

fn default_latin_cps() -> f64 {
    15.0
}

fn default_cjk_chars_per_line() -> usize {
    25
}

fn default_latin_chars_per_line() -> usize {
    42
}

fn default_tiny_text_chars() -> usize {
    3
}

fn default_tiny_text_multiplier() -> f64 {
    3.0
}

fn default_short_text_chars() -> usize {
    5
}

fn default_short_text_multiplier() -> f64 {
    2.0
}

fn default_medium_text_chars() -> usize {
    10
}

fn default_medium_text_multiplier() -> f64 {
    1.5
}

fn default_benefit_threshold() -> f64 {
    5.0
}

fn default_max_merge_gap() -> f64 {
    2.0
}

fn default_max_merged_duration() -> f64 {
    6.0
}

fn default_max_merged_lines() -> usize {
    2
}

fn default_endpoint() -> String {
    "https://api.elevenlabs.io/v1/speech-to-text".to_string()
}

fn default_model() -> String {
    "scribe_v2".to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

fn default_split_duration_minutes() -> u64 {
    90
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit_per_minute() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    30 * 60
}

impl Config {
    /// Load configuration from `path`, or from the default locations when `None`.
    ///
    /// An explicit path must exist. Without one, `conf.json` in the working
    /// directory is tried, then `<config dir>/scribe2srt/conf.json`; when neither
    /// exists the built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(anyhow!("Config file not found: {:?}", explicit));
                }
                Some(explicit.to_path_buf())
            }
            None => Self::default_locations().into_iter().find(|p| p.exists()),
        };

        match candidate {
            Some(config_path) => Self::from_file(&config_path),
            None => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a configuration file
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {:?}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {:?}", config_path))?;

        debug!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
        match dirs::config_dir() {
            Some(dir) => locations.push(dir.join("scribe2srt").join(DEFAULT_CONFIG_FILE)),
            None => warn!("Could not determine the user configuration directory"),
        }
        locations
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let subtitle = &self.subtitle;
        if subtitle.min_duration <= 0.0 || subtitle.max_duration <= 0.0 {
            return Err(anyhow!("Subtitle durations must be positive"));
        }
        if subtitle.min_duration > subtitle.max_duration {
            return Err(anyhow!(
                "Minimum duration ({}) exceeds maximum duration ({})",
                subtitle.min_duration,
                subtitle.max_duration
            ));
        }
        if subtitle.min_gap < 0.0 {
            return Err(anyhow!("Minimum gap must not be negative"));
        }
        if subtitle.cjk_cps <= 0.0 || subtitle.latin_cps <= 0.0 {
            return Err(anyhow!("Characters per second must be positive"));
        }
        if subtitle.cjk_chars_per_line == 0 || subtitle.latin_chars_per_line == 0 {
            return Err(anyhow!("Characters per line must be positive"));
        }

        let transcription = &self.transcription;
        if transcription.max_concurrent == 0 {
            return Err(anyhow!("Max concurrent chunks must be at least 1"));
        }
        if transcription.max_retries == 0 {
            return Err(anyhow!("Max retries must be at least 1"));
        }
        if transcription.rate_limit_per_minute == 0 {
            return Err(anyhow!("Rate limit must be at least 1 request per minute"));
        }
        if transcription.split_duration_minutes == 0 {
            return Err(anyhow!("Split duration must be at least 1 minute"));
        }

        crate::language_utils::validate_language_code(&transcription.language)?;

        Ok(())
    }
}
