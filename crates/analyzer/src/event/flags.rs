//! Per-event diagnostic flags derived after parsing.
//!
//! `evacuation_failure` is observed directly in the log and left untouched;
//! everything else is a pure function of the event and the thresholds.

use crate::conf::Thresholds;

use super::GcEvent;

/// Derive flags for every event in place.
pub fn derive_all(events: &mut [GcEvent], thresholds: &Thresholds) {
    for event in events.iter_mut() {
        derive(event, thresholds);
    }
}

pub fn derive(event: &mut GcEvent, thresholds: &Thresholds) {
    event.flags.survivor_overflow = event
        .regions
        .survivor
        .is_some_and(|s| matches!(s.target, Some(target) if target > 0 && s.after >= target));

    event.flags.humongous_growth = event
        .regions
        .humongous
        .is_some_and(|h| h.after > h.before);

    event.flags.slow_phase = event
        .phases
        .slowest()
        .is_some_and(|(_, ms)| ms > thresholds.slow_phase_ms);

    event.flags.pause_target_exceeded =
        event.category.is_pause() && event.duration_ms > thresholds.pause_target_ms;
}
