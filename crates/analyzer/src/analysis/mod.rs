/// GC analysis over a finalized event sequence
///
/// - `aggregate.rs`: Single-pass metrics (throughput, percentiles, rates)
/// - `promotion.rs` / `humongous.rs`: Streaming trackers fed by the aggregator
/// - `trend.rs`: Heap-growth regression and leak severity
/// - `flags.rs`: Threshold-derived findings and the overall severity
/// - `stats.rs`: Percentile, variance and least-squares helpers

pub mod aggregate;
pub mod flags;
pub mod humongous;
pub mod promotion;
pub mod stats;
pub mod trend;

pub use aggregate::{aggregate, AllocationStats, ConcurrentStats, GcMetrics, MetricsAggregator, PauseStats};
pub use flags::{AnalysisFlags, Finding, Severity};
pub use humongous::{HumongousStats, HumongousTrend};
pub use promotion::PromotionStats;
pub use trend::{LeakSeverity, MemoryTrend};

use serde::Serialize;
use tracing::debug;

use crate::conf::Thresholds;
use crate::event::GcEvent;
use crate::parser::HeapConfig;

/// Everything computed from one event sequence. Read-only for consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcAnalysis {
    pub metrics: GcMetrics,
    pub trend: MemoryTrend,
    pub flags: AnalysisFlags,
    pub severity: Severity,
}

/// Run the aggregator, trend detector and aggregate flags.
pub fn analyze(events: &[GcEvent], heap: &HeapConfig, thresholds: &Thresholds) -> GcAnalysis {
    let metrics = aggregate(events, heap, thresholds);
    let trend = trend::detect(events, thresholds);
    let flags = flags::derive(&metrics, &trend, thresholds);
    let severity = flags.severity();
    debug!(
        events = metrics.total_events,
        throughput = ?metrics.throughput_percent,
        ?severity,
        "Analysis complete"
    );
    GcAnalysis {
        metrics,
        trend,
        flags,
        severity,
    }
}
