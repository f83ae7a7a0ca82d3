//! Memory trend / leak detection.
//!
//! Least-squares fit of post-collection heap occupancy (MB) against elapsed
//! hours. Short or sparse logs never produce a verdict: below the sample or
//! span floor the trend stays at [`LeakSeverity::None`].

use serde::Serialize;
use tracing::debug;

use crate::conf::Thresholds;
use crate::event::GcEvent;
use crate::parser::units::to_mb;

use super::stats::linear_regression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakSeverity {
    #[default]
    None,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryTrend {
    /// Events with heap data that fed the fit
    pub samples: usize,
    pub span_minutes: f64,
    /// False when too few samples or too short a span
    pub evaluated: bool,
    pub growth_mb_per_hour: f64,
    /// Growth relative to the largest heap capacity observed
    pub growth_percent_per_hour: f64,
    /// R² of the fit
    pub confidence: f64,
    /// Hours until the observed maximum heap is reached at this rate
    pub projected_exhaustion_hours: Option<f64>,
    pub severity: LeakSeverity,
}

/// Fit the heap trend of `events`. Pure: the same input always yields the same trend.
pub fn detect(events: &[GcEvent], thresholds: &Thresholds) -> MemoryTrend {
    let samples: Vec<(f64, u64, u64)> = events
        .iter()
        .filter(|e| e.category.is_pause())
        .filter_map(|e| e.heap.map(|h| (e.timestamp, h.after, h.total)))
        .collect();

    let mut trend = MemoryTrend {
        samples: samples.len(),
        ..MemoryTrend::default()
    };
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return trend;
    };
    trend.span_minutes = (last.0 - first.0) / 60.0;

    if samples.len() < thresholds.trend_min_samples || trend.span_minutes < thresholds.trend_min_span_minutes {
        debug!(
            "Memory trend skipped: {} samples over {:.1} minutes",
            samples.len(),
            trend.span_minutes
        );
        return trend;
    }

    let origin = first.0;
    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|&(ts, after, _)| ((ts - origin) / 3600.0, to_mb(after)))
        .collect();
    let Some(fit) = linear_regression(&points) else {
        return trend;
    };

    trend.evaluated = true;
    trend.growth_mb_per_hour = fit.slope;
    trend.confidence = fit.r_squared;

    let max_heap_mb = samples.iter().map(|&(_, _, total)| to_mb(total)).fold(0.0, f64::max);
    if max_heap_mb > 0.0 {
        trend.growth_percent_per_hour = fit.slope / max_heap_mb * 100.0;
    }
    if fit.slope > 0.0 {
        let latest_mb = to_mb(last.1);
        trend.projected_exhaustion_hours = Some(((max_heap_mb - latest_mb) / fit.slope).max(0.0));
    }

    trend.severity = if fit.r_squared <= thresholds.trend_min_confidence {
        LeakSeverity::None
    } else if fit.slope > thresholds.leak_critical_mb_per_hour
        || trend.growth_percent_per_hour > thresholds.leak_critical_percent_per_hour
    {
        LeakSeverity::Critical
    } else if fit.slope > thresholds.leak_warning_mb_per_hour
        || trend.growth_percent_per_hour > thresholds.leak_warning_percent_per_hour
    {
        LeakSeverity::Warning
    } else {
        LeakSeverity::None
    };
    trend
}
