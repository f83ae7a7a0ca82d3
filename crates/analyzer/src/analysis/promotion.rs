use serde::Serialize;

use crate::event::{GcCategory, GcEvent};

/// Old-generation growth across young collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PromotionStats {
    /// Young collections with old-generation data on both sides
    pub samples: usize,
    pub total_promoted_bytes: u64,
    pub avg_promoted_bytes: f64,
    pub max_promoted_bytes: u64,
    pub avg_growth_ratio: f64,
    pub max_growth_ratio: f64,
    /// Collections whose growth ratio exceeded the warning multiplier
    pub spike_count: usize,
    /// Longest run of consecutive spikes
    pub max_spike_streak: usize,
}

/// Streaming accumulator fed one event at a time.
#[derive(Debug)]
pub struct PromotionTracker {
    growth_warning: f64,
    stats: PromotionStats,
    promoted_samples: usize,
    ratio_sum: f64,
    streak: usize,
}

impl PromotionTracker {
    pub fn new(growth_warning: f64) -> Self {
        Self {
            growth_warning,
            stats: PromotionStats::default(),
            promoted_samples: 0,
            ratio_sum: 0.0,
            streak: 0,
        }
    }

    pub fn observe(&mut self, event: &GcEvent) {
        if event.category != GcCategory::Young {
            return;
        }
        let (Some(before), Some(after)) = (event.memory.old_before, event.memory.old_after) else {
            return;
        };
        self.stats.samples += 1;

        if after >= before {
            let promoted = after - before;
            self.promoted_samples += 1;
            self.stats.total_promoted_bytes += promoted;
            self.stats.max_promoted_bytes = self.stats.max_promoted_bytes.max(promoted);
        }

        let ratio = if before == 0 { 1.0 } else { after as f64 / before as f64 };
        self.ratio_sum += ratio;
        self.stats.max_growth_ratio = self.stats.max_growth_ratio.max(ratio);

        if ratio > self.growth_warning {
            self.stats.spike_count += 1;
            self.streak += 1;
        } else {
            self.stats.max_spike_streak = self.stats.max_spike_streak.max(self.streak);
            self.streak = 0;
        }
    }

    pub fn finish(mut self) -> PromotionStats {
        self.stats.max_spike_streak = self.stats.max_spike_streak.max(self.streak);
        if self.promoted_samples > 0 {
            self.stats.avg_promoted_bytes = self.stats.total_promoted_bytes as f64 / self.promoted_samples as f64;
        }
        if self.stats.samples > 0 {
            self.stats.avg_growth_ratio = self.ratio_sum / self.stats.samples as f64;
        }
        self.stats
    }
}
