//! GC event data model.
//!
//! One [`GcEvent`] per cycle ID. Events are assembled incrementally by the
//! parser and become immutable once finalized; [`flags`] then derives the
//! per-event diagnostic booleans from the configured thresholds.

pub mod flags;

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Closed classification of a GC cycle, resolved once from the log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GcCategory {
    Young,
    Mixed,
    Full,
    ConcurrentMark,
    ConcurrentAbort,
    #[default]
    Unknown,
}

impl GcCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GcCategory::Young => "Young",
            GcCategory::Mixed => "Mixed",
            GcCategory::Full => "Full",
            GcCategory::ConcurrentMark => "Concurrent Mark",
            GcCategory::ConcurrentAbort => "Concurrent Mark Abort",
            GcCategory::Unknown => "Unknown",
        }
    }

    /// Stop-the-world categories. `Unknown` only ever comes from a pause line
    /// whose type token is not Young/Mixed/Full (e.g. `Pause Remark`).
    pub fn is_pause(&self) -> bool {
        match self {
            GcCategory::Young | GcCategory::Mixed | GcCategory::Full | GcCategory::Unknown => true,
            GcCategory::ConcurrentMark | GcCategory::ConcurrentAbort => false,
        }
    }

    pub fn is_concurrent(&self) -> bool {
        !self.is_pause()
    }
}

/// Heap occupancy around one collection, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HeapUsage {
    pub before: u64,
    pub after: u64,
    pub total: u64,
}

/// One `<Region> regions: before->after(target)` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegionTransition {
    pub before: u64,
    pub after: u64,
    pub target: Option<u64>,
    /// `before * region_size`, once the region size is known
    pub before_bytes: Option<u64>,
    pub after_bytes: Option<u64>,
}

impl RegionTransition {
    pub fn new(before: u64, after: u64, target: Option<u64>) -> Self {
        Self {
            before,
            after,
            target,
            before_bytes: None,
            after_bytes: None,
        }
    }

    fn apply_region_size(&mut self, region_size: u64) {
        self.before_bytes = self.before.checked_mul(region_size);
        self.after_bytes = self.after.checked_mul(region_size);
    }

    /// Largest count seen on either side of the collection.
    pub fn peak(&self) -> u64 {
        self.before.max(self.after)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Eden,
    Survivor,
    Old,
    Humongous,
    Archive,
}

impl RegionKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Eden" => Some(RegionKind::Eden),
            "Survivor" => Some(RegionKind::Survivor),
            "Old" => Some(RegionKind::Old),
            "Humongous" => Some(RegionKind::Humongous),
            "Archive" => Some(RegionKind::Archive),
            _ => None,
        }
    }
}

/// Per-generation region counts. Repeated lines for a kind overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionStats {
    pub eden: Option<RegionTransition>,
    pub survivor: Option<RegionTransition>,
    pub old: Option<RegionTransition>,
    pub humongous: Option<RegionTransition>,
    pub archive: Option<RegionTransition>,
}

impl RegionStats {
    pub fn set(&mut self, kind: RegionKind, mut transition: RegionTransition, region_size: Option<u64>) {
        if let Some(size) = region_size {
            transition.apply_region_size(size);
        }
        let slot = match kind {
            RegionKind::Eden => &mut self.eden,
            RegionKind::Survivor => &mut self.survivor,
            RegionKind::Old => &mut self.old,
            RegionKind::Humongous => &mut self.humongous,
            RegionKind::Archive => &mut self.archive,
        };
        *slot = Some(transition);
    }

    pub fn is_empty(&self) -> bool {
        self.eden.is_none()
            && self.survivor.is_none()
            && self.old.is_none()
            && self.humongous.is_none()
            && self.archive.is_none()
    }

    /// Sum of all region counts after the collection.
    pub fn total_after(&self) -> u64 {
        self.iter().map(|r| r.after).sum()
    }

    fn iter(&self) -> impl Iterator<Item = &RegionTransition> {
        [&self.eden, &self.survivor, &self.old, &self.humongous, &self.archive]
            .into_iter()
            .flatten()
    }

    fn apply_region_size(&mut self, region_size: u64) {
        for slot in [
            &mut self.eden,
            &mut self.survivor,
            &mut self.old,
            &mut self.humongous,
            &mut self.archive,
        ]
        .into_iter()
        .flatten()
        {
            slot.apply_region_size(region_size);
        }
    }
}

/// Memory per generation in bytes, derived when the event is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenerationMemory {
    pub young_before: Option<u64>,
    pub young_after: Option<u64>,
    pub old_before: Option<u64>,
    pub old_after: Option<u64>,
    /// True when old-gen values were approximated as heap - young - humongous
    pub old_estimated: bool,
    pub humongous_before: Option<u64>,
    pub humongous_after: Option<u64>,
}

/// Parallel worker phase timings (`<Name> (ms): Min/Avg/Max/Diff/Sum/Workers`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WorkerPhase {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub diff_ms: f64,
    pub sum_ms: f64,
    pub workers: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    pub root_scan_ms: Option<f64>,
    pub object_copy_ms: Option<f64>,
    pub termination_ms: Option<f64>,
    pub reference_processing_ms: Option<f64>,
    pub pre_evacuate_ms: Option<f64>,
    pub evacuate_ms: Option<f64>,
    pub post_evacuate_ms: Option<f64>,
    pub other_ms: Option<f64>,
    /// Every worker phase by name, as printed
    pub worker_phases: BTreeMap<String, WorkerPhase>,
    /// Every `<Name>: <ms>ms` sub-phase by name, as printed
    pub sub_phases: BTreeMap<String, f64>,
}

impl PhaseTimings {
    pub fn record_worker_phase(&mut self, name: &str, phase: WorkerPhase) {
        match name {
            "Ext Root Scanning" => self.root_scan_ms = Some(phase.avg_ms),
            "Object Copy" => self.object_copy_ms = Some(phase.avg_ms),
            "Termination" => self.termination_ms = Some(phase.avg_ms),
            _ => {}
        }
        self.worker_phases.insert(name.to_string(), phase);
    }

    pub fn record_sub_phase(&mut self, name: &str, duration_ms: f64) {
        match name {
            "Reference Processing" | "Ref Proc" => self.reference_processing_ms = Some(duration_ms),
            "Pre Evacuate Collection Set" => self.pre_evacuate_ms = Some(duration_ms),
            "Evacuate Collection Set" => self.evacuate_ms = Some(duration_ms),
            "Post Evacuate Collection Set" => self.post_evacuate_ms = Some(duration_ms),
            "Other" => self.other_ms = Some(duration_ms),
            _ => {}
        }
        self.sub_phases.insert(name.to_string(), duration_ms);
    }

    /// Slowest individual phase. Worker phases count by their average; the
    /// umbrella "... Collection Set" sub-phases are excluded.
    pub fn slowest(&self) -> Option<(&str, f64)> {
        let workers = self
            .worker_phases
            .iter()
            .map(|(name, phase)| (name.as_str(), phase.avg_ms));
        let subs = self
            .sub_phases
            .iter()
            .filter(|(name, _)| !name.ends_with("Collection Set"))
            .map(|(name, ms)| (name.as_str(), *ms));
        workers
            .chain(subs)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerCounts {
    pub used: Option<u32>,
    pub available: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CpuTimes {
    pub user_secs: f64,
    pub sys_secs: f64,
    pub real_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetaspaceUsage {
    pub used_before: u64,
    pub committed_before: Option<u64>,
    pub used_after: u64,
    /// Committed (JDK 17+) or reserved (JDK 11) capacity after the collection
    pub capacity_after: u64,
}

/// Per-event diagnostic flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventFlags {
    /// Observed in the log (to-space exhausted / evacuation failure)
    pub evacuation_failure: bool,
    pub survivor_overflow: bool,
    pub humongous_growth: bool,
    pub slow_phase: bool,
    pub pause_target_exceeded: bool,
}

impl EventFlags {
    pub fn any(&self) -> bool {
        self.evacuation_failure
            || self.survivor_overflow
            || self.humongous_growth
            || self.slow_phase
            || self.pause_target_exceeded
    }
}

/// One GC cycle reconstructed from the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GcEvent {
    pub id: u32,
    /// Seconds (JVM uptime, or epoch seconds for wall-clock-only logs)
    pub timestamp: f64,
    pub wall_time: Option<DateTime<FixedOffset>>,
    pub category: GcCategory,
    pub subtype: Option<String>,
    pub cause: Option<String>,
    /// Pause duration, or total cycle time for concurrent events
    pub duration_ms: f64,
    pub heap: Option<HeapUsage>,
    pub regions: RegionStats,
    pub memory: GenerationMemory,
    pub phases: PhaseTimings,
    pub workers: WorkerCounts,
    pub metaspace: Option<MetaspaceUsage>,
    pub cpu: Option<CpuTimes>,
    /// (before - after) / before, only when before > 0 and after <= before
    pub collection_efficiency: Option<f64>,
    /// after / total, only when total > 0
    pub heap_utilization: Option<f64>,
    pub aborted: bool,
    pub finalized: bool,
    pub flags: EventFlags,
}

impl GcEvent {
    pub fn new(id: u32, category: GcCategory, timestamp: f64, wall_time: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            id,
            category,
            timestamp,
            wall_time,
            ..Self::default()
        }
    }

    /// Timestamp of the end of the event, in seconds.
    pub fn end_time(&self) -> f64 {
        self.timestamp + self.duration_ms / 1000.0
    }

    /// Compute every memory-derived field. Called once when the event closes.
    pub fn finalize(&mut self, region_size: Option<u64>) {
        if let Some(size) = region_size {
            self.regions.apply_region_size(size);
        }
        self.derive_generation_memory();
        self.derive_heap_ratios();
        self.finalized = true;
    }

    fn derive_generation_memory(&mut self) {
        let bytes = |t: &Option<RegionTransition>| t.map(|r| (r.before_bytes, r.after_bytes));

        let eden = bytes(&self.regions.eden);
        let survivor = bytes(&self.regions.survivor);
        if eden.is_some() || survivor.is_some() {
            let (eb, ea) = eden.unwrap_or((Some(0), Some(0)));
            let (sb, sa) = survivor.unwrap_or((Some(0), Some(0)));
            self.memory.young_before = eb.zip(sb).map(|(e, s)| e + s);
            self.memory.young_after = ea.zip(sa).map(|(e, s)| e + s);
        }

        if let Some((hb, ha)) = bytes(&self.regions.humongous) {
            self.memory.humongous_before = hb;
            self.memory.humongous_after = ha;
        }

        if let Some((ob, oa)) = bytes(&self.regions.old) {
            self.memory.old_before = ob;
            self.memory.old_after = oa;
            self.memory.old_estimated = false;
        } else if let Some(heap) = self.heap {
            let humongous_before = self.memory.humongous_before.unwrap_or(0);
            let humongous_after = self.memory.humongous_after.unwrap_or(0);
            if let (Some(young_before), Some(young_after)) = (self.memory.young_before, self.memory.young_after) {
                self.memory.old_before = Some(heap.before.saturating_sub(young_before + humongous_before));
                self.memory.old_after = Some(heap.after.saturating_sub(young_after + humongous_after));
                self.memory.old_estimated = true;
            }
        }
    }

    fn derive_heap_ratios(&mut self) {
        let Some(heap) = self.heap else { return };
        self.collection_efficiency = if heap.before > 0 && heap.after <= heap.before {
            Some((heap.before - heap.after) as f64 / heap.before as f64)
        } else {
            None
        };
        self.heap_utilization = if heap.total > 0 {
            Some(heap.after as f64 / heap.total as f64)
        } else {
            None
        };
    }
}
