//! Single-pass metrics aggregation.
//!
//! [`MetricsAggregator::observe`] is called once per event in sequence order;
//! [`MetricsAggregator::finish`] sorts the pause durations once and produces
//! the immutable [`GcMetrics`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::conf::Thresholds;
use crate::event::{GcCategory, GcEvent};
use crate::parser::units::to_mb;
use crate::parser::HeapConfig;

use super::humongous::{HumongousStats, HumongousTracker};
use super::promotion::{PromotionStats, PromotionTracker};
use super::stats::{mean, normalized_variance, percentile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PauseStats {
    pub count: usize,
    pub total_ms: f64,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Population variance normalized by mean²
    pub variance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AllocationStats {
    /// Intervals with positive growth between consecutive collections
    pub samples: usize,
    pub total_allocated_bytes: u64,
    /// Total allocated over total elapsed time
    pub avg_rate_mb_s: f64,
    pub peak_rate_mb_s: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConcurrentStats {
    pub cycles: usize,
    pub aborted: usize,
    pub total_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GcMetrics {
    pub total_events: usize,
    pub events_by_category: BTreeMap<GcCategory, usize>,
    /// Pause time (ms) per category
    pub time_by_category: BTreeMap<GcCategory, f64>,
    /// Pause time (ms) per cause string
    pub time_by_cause: BTreeMap<String, f64>,
    pub elapsed_secs: f64,
    /// Share of elapsed time not spent in pauses, 0..=100. `None` when the
    /// events carry no spread of timestamps to measure a window against.
    pub throughput_percent: Option<f64>,
    pub pauses: PauseStats,
    pub avg_collection_efficiency: Option<f64>,
    pub avg_heap_utilization: Option<f64>,
    /// Regions in use after collection over total regions, averaged
    pub avg_region_utilization: Option<f64>,
    pub evacuation_failures: usize,
    /// Percent of pause events with an evacuation failure
    pub evacuation_failure_rate: f64,
    pub pause_target_misses: usize,
    pub pause_target_miss_percent: f64,
    pub slow_phase_events: usize,
    pub survivor_overflows: usize,
    pub humongous_growth_events: usize,
    pub allocation: AllocationStats,
    pub concurrent: ConcurrentStats,
    pub promotion: PromotionStats,
    pub humongous: HumongousStats,
}

impl GcMetrics {
    pub fn count(&self, category: GcCategory) -> usize {
        self.events_by_category.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

pub struct MetricsAggregator<'a> {
    heap: &'a HeapConfig,
    metrics: GcMetrics,
    durations: Vec<f64>,
    first_ts: Option<f64>,
    last_ts: f64,
    last_end: f64,
    efficiency: Mean,
    utilization: Mean,
    region_utilization: Mean,
    /// (timestamp, heap after) of the previous pause with heap data
    previous_heap: Option<(f64, u64)>,
    promotion: PromotionTracker,
    humongous: HumongousTracker<'a>,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(heap: &'a HeapConfig, thresholds: &Thresholds) -> Self {
        Self {
            heap,
            metrics: GcMetrics::default(),
            durations: Vec::new(),
            first_ts: None,
            last_ts: 0.0,
            last_end: 0.0,
            efficiency: Mean::default(),
            utilization: Mean::default(),
            region_utilization: Mean::default(),
            previous_heap: None,
            promotion: PromotionTracker::new(thresholds.promotion_growth_warning),
            humongous: HumongousTracker::new(heap),
        }
    }

    pub fn observe(&mut self, event: &GcEvent) {
        let m = &mut self.metrics;
        m.total_events += 1;
        *m.events_by_category.entry(event.category).or_insert(0) += 1;

        if self.first_ts.is_none() {
            self.first_ts = Some(event.timestamp);
        }
        self.last_ts = self.last_ts.max(event.timestamp);
        self.last_end = self.last_end.max(event.end_time());

        if event.category.is_concurrent() {
            m.concurrent.cycles += 1;
            m.concurrent.total_ms += event.duration_ms;
            m.concurrent.max_ms = m.concurrent.max_ms.max(event.duration_ms);
            if event.aborted {
                m.concurrent.aborted += 1;
            }
            return;
        }

        self.durations.push(event.duration_ms);
        *m.time_by_category.entry(event.category).or_insert(0.0) += event.duration_ms;
        if let Some(cause) = &event.cause {
            *m.time_by_cause.entry(cause.clone()).or_insert(0.0) += event.duration_ms;
        }

        if event.flags.evacuation_failure {
            m.evacuation_failures += 1;
        }
        if event.flags.pause_target_exceeded {
            m.pause_target_misses += 1;
        }
        if event.flags.slow_phase {
            m.slow_phase_events += 1;
        }
        if event.flags.survivor_overflow {
            m.survivor_overflows += 1;
        }
        if event.flags.humongous_growth {
            m.humongous_growth_events += 1;
        }

        if let Some(efficiency) = event.collection_efficiency {
            self.efficiency.add(efficiency);
        }
        if let Some(utilization) = event.heap_utilization {
            self.utilization.add(utilization);
        }

        if let Some(heap) = event.heap {
            if !event.regions.is_empty() {
                if let Some(total_regions) = self.heap.regions_for(heap.total).filter(|&n| n > 0) {
                    self.region_utilization
                        .add(event.regions.total_after() as f64 / total_regions as f64);
                }
            }

            if let Some((previous_ts, previous_after)) = self.previous_heap {
                let dt = event.timestamp - previous_ts;
                if heap.before > previous_after && dt > 0.0 {
                    let allocated = heap.before - previous_after;
                    m.allocation.samples += 1;
                    m.allocation.total_allocated_bytes += allocated;
                    m.allocation.peak_rate_mb_s = m.allocation.peak_rate_mb_s.max(to_mb(allocated) / dt);
                }
            }
            self.previous_heap = Some((event.timestamp, heap.after));
        }

        self.promotion.observe(event);
        self.humongous.observe(event);
    }

    pub fn finish(mut self, thresholds: &Thresholds) -> GcMetrics {
        let mut m = self.metrics;

        let (elapsed, spread) = match self.first_ts {
            Some(first) => ((self.last_end - first).max(0.0), self.last_ts > first),
            None => (0.0, false),
        };
        m.elapsed_secs = elapsed;

        self.durations.sort_by(f64::total_cmp);
        let total_ms: f64 = self.durations.iter().sum();
        if let (Some(&min), Some(&max)) = (self.durations.first(), self.durations.last()) {
            m.pauses = PauseStats {
                count: self.durations.len(),
                total_ms,
                min_ms: min,
                avg_ms: mean(&self.durations),
                max_ms: max,
                p50_ms: percentile(&self.durations, 50.0),
                p95_ms: percentile(&self.durations, 95.0),
                p99_ms: percentile(&self.durations, 99.0),
                variance: normalized_variance(&self.durations),
            };
        }

        m.throughput_percent = if total_ms <= 0.0 {
            Some(100.0)
        } else if spread && elapsed > 0.0 {
            Some(((1.0 - (total_ms / 1000.0) / elapsed) * 100.0).clamp(0.0, 100.0))
        } else {
            None
        };

        let pause_count = m.pauses.count;
        if pause_count > 0 {
            m.evacuation_failure_rate = m.evacuation_failures as f64 / pause_count as f64 * 100.0;
            m.pause_target_miss_percent = m.pause_target_misses as f64 / pause_count as f64 * 100.0;
        }
        if m.concurrent.cycles > 0 {
            m.concurrent.avg_ms = m.concurrent.total_ms / m.concurrent.cycles as f64;
        }
        if elapsed > 0.0 {
            m.allocation.avg_rate_mb_s = to_mb(m.allocation.total_allocated_bytes) / elapsed;
        }

        m.avg_collection_efficiency = self.efficiency.value();
        m.avg_heap_utilization = self.utilization.value();
        m.avg_region_utilization = self.region_utilization.value();
        m.promotion = self.promotion.finish();
        m.humongous = self.humongous.finish(thresholds);
        m
    }
}

/// Aggregate a whole event sequence.
pub fn aggregate(events: &[GcEvent], heap: &HeapConfig, thresholds: &Thresholds) -> GcMetrics {
    let mut aggregator = MetricsAggregator::new(heap, thresholds);
    for event in events {
        aggregator.observe(event);
    }
    aggregator.finish(thresholds)
}
