use serde::Serialize;

use crate::conf::Thresholds;
use crate::event::GcCategory;

use super::aggregate::GcMetrics;
use super::trend::{LeakSeverity, MemoryTrend};

/// Overall health of the analysed log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Ok,
    Info,
    Warning,
    Critical,
}

/// One threshold-derived condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    ThroughputCritical,
    ThroughputLow,
    MemoryLeakCritical,
    MemoryLeakWarning,
    EvacuationFailureRate,
    EvacuationFailures,
    LongPauses,
    HighPauseVariance,
    PauseTargetMisses,
    HighAllocationRate,
    PromotionSpikes,
    HumongousLeak,
    FullCollections,
    SlowPhases,
    SurvivorOverflow,
    HumongousGrowth,
    ConcurrentMarkAborts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisFlags {
    pub critical: Vec<Finding>,
    pub warning: Vec<Finding>,
    pub info: Vec<Finding>,
}

impl AnalysisFlags {
    pub fn contains(&self, finding: Finding) -> bool {
        self.critical.contains(&finding) || self.warning.contains(&finding) || self.info.contains(&finding)
    }

    pub fn severity(&self) -> Severity {
        if !self.critical.is_empty() {
            Severity::Critical
        } else if !self.warning.is_empty() {
            Severity::Warning
        } else if !self.info.is_empty() {
            Severity::Info
        } else {
            Severity::Ok
        }
    }
}

/// Evaluate every aggregate condition against the thresholds.
pub fn derive(metrics: &GcMetrics, trend: &MemoryTrend, t: &Thresholds) -> AnalysisFlags {
    let mut flags = AnalysisFlags::default();
    let has_pauses = metrics.pauses.count > 0;

    if let Some(throughput) = metrics.throughput_percent.filter(|_| has_pauses) {
        if throughput < t.throughput_critical_percent {
            flags.critical.push(Finding::ThroughputCritical);
        } else if throughput < t.throughput_warning_percent {
            flags.warning.push(Finding::ThroughputLow);
        }
    }

    match trend.severity {
        LeakSeverity::Critical => flags.critical.push(Finding::MemoryLeakCritical),
        LeakSeverity::Warning => flags.warning.push(Finding::MemoryLeakWarning),
        LeakSeverity::None => {}
    }

    if metrics.evacuation_failure_rate > t.evacuation_failure_rate_warning {
        flags.critical.push(Finding::EvacuationFailureRate);
    } else if metrics.evacuation_failures > 0 {
        flags.info.push(Finding::EvacuationFailures);
    }

    if has_pauses && metrics.pauses.p99_ms > t.long_pause_p99_ms {
        flags.warning.push(Finding::LongPauses);
    }
    if metrics.pauses.variance > t.pause_variance_warning {
        flags.warning.push(Finding::HighPauseVariance);
    }
    if metrics.pause_target_miss_percent > t.pause_target_miss_percent_warning {
        flags.warning.push(Finding::PauseTargetMisses);
    }
    if metrics.allocation.avg_rate_mb_s > t.allocation_rate_warning_mb_s {
        flags.warning.push(Finding::HighAllocationRate);
    }
    if metrics.promotion.max_spike_streak >= t.promotion_spike_streak_warning {
        flags.warning.push(Finding::PromotionSpikes);
    }
    if metrics.humongous.is_leak {
        flags.warning.push(Finding::HumongousLeak);
    }
    if metrics.count(GcCategory::Full) > 0 {
        flags.warning.push(Finding::FullCollections);
    }

    if metrics.slow_phase_events > 0 {
        flags.info.push(Finding::SlowPhases);
    }
    if metrics.survivor_overflows > 0 {
        flags.info.push(Finding::SurvivorOverflow);
    }
    if metrics.humongous_growth_events > 0 {
        flags.info.push(Finding::HumongousGrowth);
    }
    if metrics.concurrent.aborted > 0 {
        flags.info.push(Finding::ConcurrentMarkAborts);
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_are_ok() {
        let metrics = GcMetrics { throughput_percent: Some(100.0), ..GcMetrics::default() };
        let flags = derive(&metrics, &MemoryTrend::default(), &Thresholds::default());
        assert_eq!(flags, AnalysisFlags::default());
        assert_eq!(flags.severity(), Severity::Ok);
    }

    #[test]
    fn test_throughput_levels() {
        let mut metrics = GcMetrics::default();
        metrics.pauses.count = 10;
        metrics.throughput_percent = Some(92.0);
        let flags = derive(&metrics, &MemoryTrend::default(), &Thresholds::default());
        assert!(flags.warning.contains(&Finding::ThroughputLow));
        assert_eq!(flags.severity(), Severity::Warning);

        metrics.throughput_percent = Some(85.0);
        let flags = derive(&metrics, &MemoryTrend::default(), &Thresholds::default());
        assert!(flags.critical.contains(&Finding::ThroughputCritical));
        assert!(!flags.contains(Finding::ThroughputLow));
        assert_eq!(flags.severity(), Severity::Critical);
    }

    #[test]
    fn test_unknown_throughput_raises_nothing() {
        let mut metrics = GcMetrics::default();
        metrics.pauses.count = 1;
        let flags = derive(&metrics, &MemoryTrend::default(), &Thresholds::default());
        assert!(!flags.contains(Finding::ThroughputCritical));
        assert!(!flags.contains(Finding::ThroughputLow));
    }

    #[test]
    fn test_leak_trend_maps_to_flags() {
        let metrics = GcMetrics { throughput_percent: Some(100.0), ..GcMetrics::default() };
        let trend = MemoryTrend { severity: LeakSeverity::Critical, ..MemoryTrend::default() };
        let flags = derive(&metrics, &trend, &Thresholds::default());
        assert_eq!(flags.critical, vec![Finding::MemoryLeakCritical]);
    }

    #[test]
    fn test_evacuation_failures() {
        let mut metrics = GcMetrics { throughput_percent: Some(100.0), ..GcMetrics::default() };
        metrics.pauses.count = 1000;
        metrics.evacuation_failures = 2;
        metrics.evacuation_failure_rate = 0.2;
        let flags = derive(&metrics, &MemoryTrend::default(), &Thresholds::default());
        assert_eq!(flags.info, vec![Finding::EvacuationFailures]);
        assert_eq!(flags.severity(), Severity::Info);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Info > Severity::Ok);
    }
}
