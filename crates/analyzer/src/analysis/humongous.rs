use serde::Serialize;

use crate::conf::Thresholds;
use crate::event::GcEvent;
use crate::parser::HeapConfig;

/// Humongous region count relative to the previous humongous-bearing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HumongousTrend {
    Growing,
    Static,
    Decreasing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HumongousStats {
    /// Events with at least one humongous region on either side
    pub events: usize,
    pub max_regions: u64,
    pub max_heap_percent: f64,
    pub avg_heap_percent: f64,
    pub growing: usize,
    pub static_count: usize,
    pub decreasing: usize,
    pub is_leak: bool,
}

#[derive(Debug)]
pub struct HumongousTracker<'a> {
    heap: &'a HeapConfig,
    stats: HumongousStats,
    percent_sum: f64,
    percent_samples: usize,
    previous: Option<u64>,
}

impl<'a> HumongousTracker<'a> {
    pub fn new(heap: &'a HeapConfig) -> Self {
        Self {
            heap,
            stats: HumongousStats::default(),
            percent_sum: 0.0,
            percent_samples: 0,
            previous: None,
        }
    }

    /// Record one event; returns its trend when there is a previous humongous event.
    pub fn observe(&mut self, event: &GcEvent) -> Option<HumongousTrend> {
        let regions = event.regions.humongous?;
        let peak = regions.peak();
        if peak == 0 {
            return None;
        }
        self.stats.events += 1;
        self.stats.max_regions = self.stats.max_regions.max(peak);

        let total = event.heap.map(|h| h.total).or(self.heap.heap_max).unwrap_or(0);
        if let Some(total_regions) = self.heap.regions_for(total).filter(|&n| n > 0) {
            let percent = peak as f64 / total_regions as f64 * 100.0;
            self.percent_sum += percent;
            self.percent_samples += 1;
            self.stats.max_heap_percent = self.stats.max_heap_percent.max(percent);
        }

        let trend = self.previous.map(|previous| {
            if regions.after > previous {
                HumongousTrend::Growing
            } else if regions.after < previous {
                HumongousTrend::Decreasing
            } else {
                HumongousTrend::Static
            }
        });
        match trend {
            Some(HumongousTrend::Growing) => self.stats.growing += 1,
            Some(HumongousTrend::Static) => self.stats.static_count += 1,
            Some(HumongousTrend::Decreasing) => self.stats.decreasing += 1,
            None => {}
        }
        self.previous = Some(regions.after);
        trend
    }

    pub fn finish(mut self, thresholds: &Thresholds) -> HumongousStats {
        if self.percent_samples > 0 {
            self.stats.avg_heap_percent = self.percent_sum / self.percent_samples as f64;
        }
        let s = self.stats;
        self.stats.is_leak = s.max_heap_percent > thresholds.humongous_heap_percent_warning
            || (s.static_count * 2 > s.events && s.max_regions > thresholds.humongous_static_region_floor)
            || (s.growing > s.decreasing && s.max_regions > thresholds.humongous_growth_region_floor);
        self.stats
    }
}
