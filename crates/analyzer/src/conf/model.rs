//! Model: AnalyzerConfig, tuning profiles, and the threshold set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to merge threshold overrides: {0}")]
    Merge(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Workload profile selecting the baseline thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Balanced,
    /// Interactive services: tight pause budget
    Latency,
    /// Batch jobs: long pauses tolerated, throughput matters
    Batch,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Balanced => "balanced",
            Profile::Latency => "latency",
            Profile::Batch => "batch",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "balanced" | "default" => Some(Profile::Balanced),
            "latency" | "latency-sensitive" | "latency_sensitive" => Some(Profile::Latency),
            "batch" | "throughput" => Some(Profile::Batch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub profile: Profile,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
    /// Shortcut for `thresholds.pause_target_ms`; wins over the table
    pub pause_target_ms: Option<f64>,
    /// Field-by-field overrides layered on top of the profile
    pub thresholds: toml::Table,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Balanced,
            log_filter: "analyzer=info".to_string(),
            pause_target_ms: None,
            thresholds: toml::Table::new(),
        }
    }
}

/// Every tunable limit used by flag derivation, aggregation and trend detection.
///
/// Immutable once resolved; passed by reference into the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    // Per-event
    pub pause_target_ms: f64,
    pub slow_phase_ms: f64,

    // Pauses & throughput
    pub throughput_warning_percent: f64,
    pub throughput_critical_percent: f64,
    pub long_pause_p99_ms: f64,
    pub pause_variance_warning: f64,
    pub pause_target_miss_percent_warning: f64,
    pub evacuation_failure_rate_warning: f64,
    pub allocation_rate_warning_mb_s: f64,

    // Promotion
    pub promotion_growth_warning: f64,
    pub promotion_spike_streak_warning: usize,

    // Humongous
    pub humongous_heap_percent_warning: f64,
    pub humongous_static_region_floor: u64,
    pub humongous_growth_region_floor: u64,

    // Memory trend
    pub trend_min_samples: usize,
    pub trend_min_span_minutes: f64,
    pub trend_min_confidence: f64,
    pub leak_warning_mb_per_hour: f64,
    pub leak_critical_mb_per_hour: f64,
    pub leak_warning_percent_per_hour: f64,
    pub leak_critical_percent_per_hour: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pause_target_ms: 200.0,
            slow_phase_ms: 50.0,
            throughput_warning_percent: 95.0,
            throughput_critical_percent: 90.0,
            long_pause_p99_ms: 500.0,
            pause_variance_warning: 1.0,
            pause_target_miss_percent_warning: 5.0,
            evacuation_failure_rate_warning: 1.0,
            allocation_rate_warning_mb_s: 1000.0,
            promotion_growth_warning: 1.25,
            promotion_spike_streak_warning: 3,
            humongous_heap_percent_warning: 30.0,
            humongous_static_region_floor: 20,
            humongous_growth_region_floor: 10,
            trend_min_samples: 20,
            trend_min_span_minutes: 30.0,
            trend_min_confidence: 0.7,
            leak_warning_mb_per_hour: 50.0,
            leak_critical_mb_per_hour: 200.0,
            leak_warning_percent_per_hour: 5.0,
            leak_critical_percent_per_hour: 10.0,
        }
    }
}

impl Thresholds {
    pub fn for_profile(profile: Profile) -> Self {
        let balanced = Self::default();
        match profile {
            Profile::Balanced => balanced,
            Profile::Latency => Self {
                pause_target_ms: 50.0,
                slow_phase_ms: 20.0,
                throughput_warning_percent: 97.0,
                throughput_critical_percent: 93.0,
                long_pause_p99_ms: 100.0,
                pause_variance_warning: 0.5,
                pause_target_miss_percent_warning: 1.0,
                ..balanced
            },
            Profile::Batch => Self {
                pause_target_ms: 1000.0,
                slow_phase_ms: 200.0,
                throughput_warning_percent: 90.0,
                throughput_critical_percent: 80.0,
                long_pause_p99_ms: 2000.0,
                pause_variance_warning: 2.0,
                pause_target_miss_percent_warning: 10.0,
                ..balanced
            },
        }
    }

    /// Sanity-check limits before they reach the analysis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("pause_target_ms", self.pause_target_ms),
            ("slow_phase_ms", self.slow_phase_ms),
            ("long_pause_p99_ms", self.long_pause_p99_ms),
            ("pause_variance_warning", self.pause_variance_warning),
            ("allocation_rate_warning_mb_s", self.allocation_rate_warning_mb_s),
            ("promotion_growth_warning", self.promotion_growth_warning),
            ("trend_min_span_minutes", self.trend_min_span_minutes),
            ("leak_warning_mb_per_hour", self.leak_warning_mb_per_hour),
            ("leak_warning_percent_per_hour", self.leak_warning_percent_per_hour),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be > 0 (got {})", name, value)));
            }
        }

        for (name, value) in [
            ("throughput_warning_percent", self.throughput_warning_percent),
            ("throughput_critical_percent", self.throughput_critical_percent),
            ("pause_target_miss_percent_warning", self.pause_target_miss_percent_warning),
            ("evacuation_failure_rate_warning", self.evacuation_failure_rate_warning),
            ("humongous_heap_percent_warning", self.humongous_heap_percent_warning),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{} must be within 0..=100 (got {})", name, value)));
            }
        }

        if self.throughput_critical_percent > self.throughput_warning_percent {
            return Err(ConfigError::Invalid(
                "throughput_critical_percent must be <= throughput_warning_percent".to_string(),
            ));
        }
        if self.leak_warning_mb_per_hour >= self.leak_critical_mb_per_hour {
            return Err(ConfigError::Invalid(
                "leak_warning_mb_per_hour must be < leak_critical_mb_per_hour".to_string(),
            ));
        }
        if self.leak_warning_percent_per_hour >= self.leak_critical_percent_per_hour {
            return Err(ConfigError::Invalid(
                "leak_warning_percent_per_hour must be < leak_critical_percent_per_hour".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trend_min_confidence) {
            return Err(ConfigError::Invalid("trend_min_confidence must be within 0..=1".to_string()));
        }
        if self.trend_min_samples < 2 {
            return Err(ConfigError::Invalid("trend_min_samples must be >= 2".to_string()));
        }
        if self.humongous_growth_region_floor > self.humongous_static_region_floor {
            return Err(ConfigError::Invalid(
                "humongous_growth_region_floor must be <= humongous_static_region_floor".to_string(),
            ));
        }
        Ok(())
    }
}
