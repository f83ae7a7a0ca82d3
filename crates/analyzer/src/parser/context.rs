//! Event assembly: per-cycle state machine owned by one parse pass.
//!
//! States per cycle ID:
//! - absent → active (pause) → finalized (CPU line)
//! - absent → concurrent → finalized (cycle end), with abort as a marker
//!
//! Every creation returns an [`EventHandle`]; detail lines (regions, phases,
//! workers, metaspace) resolve theirs through [`ParseContext::target`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{trace, warn};

use crate::event::{CpuTimes, GcCategory, GcEvent};

use super::line::LogLine;
use super::model::IgnoreReason;

/// Index of an event in the output sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(usize);

/// Heap configuration captured once from the init lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeapConfig {
    pub version: Option<String>,
    pub region_size: Option<u64>,
    pub heap_max: Option<u64>,
    pub heap_initial: Option<u64>,
    pub parallel_workers: Option<u32>,
    pub concurrent_workers: Option<u32>,
}

impl HeapConfig {
    /// Region count for a heap of `total` bytes.
    pub fn regions_for(&self, total: u64) -> Option<u64> {
        match self.region_size {
            Some(size) if size > 0 && total > 0 => Some(total / size),
            _ => None,
        }
    }
}

/// Result of closing out a parse.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub events: Vec<GcEvent>,
    pub heap: HeapConfig,
    /// Pause events still open at end of input, finalized without CPU times
    pub unfinalized_pauses: usize,
    /// Concurrent cycles with no end line
    pub unfinished_concurrent: usize,
}

#[derive(Debug, Default)]
pub struct ParseContext {
    events: Vec<GcEvent>,
    /// Every cycle ID that produced an event
    index: HashMap<u32, EventHandle>,
    /// In-progress pause events
    active: HashMap<u32, EventHandle>,
    /// In-progress concurrent cycles (disjoint from `active`)
    concurrent: HashMap<u32, EventHandle>,
    /// IDs ever seen as concurrent; never eligible for pause interpretation
    concurrent_ids: HashSet<u32>,
    /// Handle returned by the most recent event creation
    cursor: Option<EventHandle>,
    timestamp: f64,
    wall_time: Option<DateTime<FixedOffset>>,
    heap: HeapConfig,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the global clock. Never moves backwards.
    pub fn observe_time(&mut self, line: &LogLine<'_>) {
        if let Some(ts) = line.timestamp {
            if ts > self.timestamp {
                self.timestamp = ts;
            }
        }
        if line.wall_time.is_some() {
            self.wall_time = line.wall_time;
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn heap(&self) -> &HeapConfig {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut HeapConfig {
        &mut self.heap
    }

    pub fn events(&self) -> &[GcEvent] {
        &self.events
    }

    pub fn event(&self, handle: EventHandle) -> &GcEvent {
        &self.events[handle.0]
    }

    pub fn event_mut(&mut self, handle: EventHandle) -> &mut GcEvent {
        &mut self.events[handle.0]
    }

    fn append(&mut self, id: u32, category: GcCategory) -> EventHandle {
        let handle = EventHandle(self.events.len());
        self.events
            .push(GcEvent::new(id, category, self.timestamp, self.wall_time));
        self.index.insert(id, handle);
        self.cursor = Some(handle);
        trace!(id, category = category.as_str(), "event created");
        handle
    }

    /// Create or reuse the active pause entry for `id`.
    pub fn open_pause(&mut self, id: u32) -> Result<EventHandle, IgnoreReason> {
        if self.concurrent_ids.contains(&id) {
            return Err(IgnoreReason::ConcurrentCycleId);
        }
        if let Some(&handle) = self.active.get(&id) {
            return Ok(handle);
        }
        if self.index.contains_key(&id) {
            return Err(IgnoreReason::AlreadyFinalized);
        }
        let handle = self.append(id, GcCategory::Unknown);
        self.active.insert(id, handle);
        Ok(handle)
    }

    /// Close the active pause `id` on its CPU line.
    pub fn finalize_pause(&mut self, id: u32, cpu: CpuTimes) -> Result<EventHandle, IgnoreReason> {
        let handle = self.active.remove(&id).ok_or(IgnoreReason::NoActiveEvent)?;
        let region_size = self.heap.region_size;
        let event = self.event_mut(handle);
        event.cpu = Some(cpu);
        event.finalize(region_size);
        Ok(handle)
    }

    /// Open a concurrent cycle; a repeated start for the same ID is a no-op.
    pub fn start_concurrent(&mut self, id: u32) -> Result<EventHandle, IgnoreReason> {
        if let Some(&handle) = self.concurrent.get(&id) {
            return Ok(handle);
        }
        if self.concurrent_ids.contains(&id) {
            return Err(IgnoreReason::AlreadyFinalized);
        }
        if self.index.contains_key(&id) {
            return Err(IgnoreReason::PauseCycleId);
        }
        let handle = self.append(id, GcCategory::ConcurrentMark);
        self.concurrent.insert(id, handle);
        self.concurrent_ids.insert(id);
        Ok(handle)
    }

    /// Close a concurrent cycle with its total duration.
    pub fn end_concurrent(&mut self, id: u32, duration_ms: f64) -> Result<EventHandle, IgnoreReason> {
        let handle = self.concurrent.remove(&id).ok_or(IgnoreReason::NoActiveEvent)?;
        let region_size = self.heap.region_size;
        let event = self.event_mut(handle);
        event.duration_ms = duration_ms;
        event.finalize(region_size);
        Ok(handle)
    }

    /// Mark a concurrent cycle aborted. The entry stays open until an end line.
    ///
    /// An abort for an ID never seen before opens the entry so the abort is kept.
    pub fn abort_concurrent(&mut self, id: u32) -> Result<EventHandle, IgnoreReason> {
        let handle = match self.concurrent.get(&id) {
            Some(&handle) => handle,
            None => self.start_concurrent(id)?,
        };
        let event = self.event_mut(handle);
        event.category = GcCategory::ConcurrentAbort;
        event.aborted = true;
        Ok(handle)
    }

    /// Resolve which open event a detail line belongs to.
    ///
    /// A line carrying `GC(n)` goes to that cycle if it is open, and nowhere
    /// otherwise. A line without an ID falls back to the cursor, provided the
    /// cursor's event is still open.
    pub fn target(&self, gc_id: Option<u32>) -> Option<EventHandle> {
        match gc_id {
            Some(id) => self
                .active
                .get(&id)
                .or_else(|| self.concurrent.get(&id))
                .copied(),
            None => self.cursor.filter(|&h| !self.events[h.0].finalized),
        }
    }

    /// Close the pass: finalize dangling pauses and hand the sequence over.
    pub fn finish(mut self) -> Assembled {
        let mut dangling: Vec<EventHandle> = self.active.drain().map(|(_, h)| h).collect();
        dangling.sort_by_key(|h| h.0);
        let region_size = self.heap.region_size;
        for &handle in &dangling {
            self.events[handle.0].finalize(region_size);
        }
        if !dangling.is_empty() {
            warn!(
                "{} pause event(s) had no CPU line before end of input; finalized without CPU times",
                dangling.len()
            );
        }

        Assembled {
            unfinalized_pauses: dangling.len(),
            unfinished_concurrent: self.concurrent.len(),
            events: self.events,
            heap: self.heap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu() -> CpuTimes {
        CpuTimes { user_secs: 0.01, sys_secs: 0.0, real_secs: 0.01 }
    }

    #[test]
    fn test_pause_lifecycle() {
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(3).unwrap();
        assert_eq!(ctx.open_pause(3).unwrap(), handle);
        assert_eq!(ctx.target(Some(3)), Some(handle));

        ctx.finalize_pause(3, cpu()).unwrap();
        assert!(ctx.event(handle).finalized);
        assert_eq!(ctx.target(Some(3)), None);
        assert_eq!(ctx.open_pause(3), Err(IgnoreReason::AlreadyFinalized));
        assert_eq!(ctx.events().len(), 1);
    }

    #[test]
    fn test_cpu_for_unknown_id_is_benign() {
        let mut ctx = ParseContext::new();
        assert_eq!(ctx.finalize_pause(9, cpu()), Err(IgnoreReason::NoActiveEvent));
    }

    #[test]
    fn test_concurrent_id_never_becomes_pause() {
        let mut ctx = ParseContext::new();
        ctx.start_concurrent(7).unwrap();
        assert_eq!(ctx.open_pause(7), Err(IgnoreReason::ConcurrentCycleId));
        ctx.end_concurrent(7, 120.0).unwrap();
        assert_eq!(ctx.open_pause(7), Err(IgnoreReason::ConcurrentCycleId));
        assert_eq!(ctx.events().len(), 1);
    }

    #[test]
    fn test_abort_without_end_stays_open() {
        let mut ctx = ParseContext::new();
        let handle = ctx.start_concurrent(7).unwrap();
        ctx.abort_concurrent(7).unwrap();
        let event = ctx.event(handle);
        assert_eq!(event.category, GcCategory::ConcurrentAbort);
        assert!(event.aborted);

        let assembled = ctx.finish();
        assert_eq!(assembled.events.len(), 1);
        assert_eq!(assembled.unfinished_concurrent, 1);
    }

    #[test]
    fn test_duplicate_concurrent_start_is_noop() {
        let mut ctx = ParseContext::new();
        let first = ctx.start_concurrent(4).unwrap();
        let second = ctx.start_concurrent(4).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.events().len(), 1);
    }

    #[test]
    fn test_pause_id_cannot_start_concurrent() {
        let mut ctx = ParseContext::new();
        ctx.open_pause(2).unwrap();
        assert_eq!(ctx.start_concurrent(2), Err(IgnoreReason::PauseCycleId));
    }

    #[test]
    fn test_cursor_fallback_only_while_open() {
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(1).unwrap();
        assert_eq!(ctx.target(None), Some(handle));
        ctx.finalize_pause(1, cpu()).unwrap();
        assert_eq!(ctx.target(None), None);
    }

    #[test]
    fn test_finish_finalizes_dangling_pauses() {
        let mut ctx = ParseContext::new();
        ctx.open_pause(1).unwrap();
        ctx.open_pause(2).unwrap();
        ctx.finalize_pause(2, cpu()).unwrap();
        let assembled = ctx.finish();
        assert_eq!(assembled.unfinalized_pauses, 1);
        assert!(assembled.events.iter().all(|e| e.finalized));
        assert!(assembled.events[0].cpu.is_none());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut ctx = ParseContext::new();
        let later = crate::parser::line::tokenize(1, "[5.0s] hello").unwrap();
        let earlier = crate::parser::line::tokenize(2, "[4.0s] hello").unwrap();
        ctx.observe_time(&later);
        ctx.observe_time(&earlier);
        assert_eq!(ctx.timestamp(), 5.0);
        let handle = ctx.open_pause(1).unwrap();
        assert_eq!(ctx.event(handle).timestamp, 5.0);
    }

    #[test]
    fn test_regions_for() {
        let heap = HeapConfig { region_size: Some(1 << 20), ..HeapConfig::default() };
        assert_eq!(heap.regions_for(256 << 20), Some(256));
        assert_eq!(HeapConfig::default().regions_for(256 << 20), None);
    }
}
