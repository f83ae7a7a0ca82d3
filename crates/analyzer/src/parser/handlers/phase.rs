use crate::event::WorkerPhase;
use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, IgnoreReason, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

const EVACUATION_FAILURE_PHASE: &str = "Evacuation Failure";

/// Worker phase statistics and `<Name>: <ms>ms` sub-phase timings.
pub struct PhaseHandler {
    worker: Recognizer,
    sub_phase: Recognizer,
}

impl PhaseHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            worker: Recognizer::new("worker_phase", Patterns::WORKER_PHASE)?,
            sub_phase: Recognizer::new("phase_time", Patterns::PHASE_TIME)?,
        })
    }
}

impl LineHandler for PhaseHandler {
    fn name(&self) -> &'static str {
        "phase"
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        if let Some(f) = self.worker.captures(line.body) {
            let name = f.text(1).unwrap_or_default().trim();
            let phase = WorkerPhase {
                min_ms: f.decimal(2, "phase_min")?,
                avg_ms: f.decimal(3, "phase_avg")?,
                max_ms: f.decimal(4, "phase_max")?,
                diff_ms: f.decimal(5, "phase_diff")?,
                sum_ms: f.decimal(6, "phase_sum")?,
                workers: f.number(7, "phase_workers")?,
            };
            let Some(handle) = ctx.target(line.gc_id) else {
                return Ok(LineOutcome::Ignored(IgnoreReason::NoTargetEvent));
            };
            ctx.event_mut(handle).phases.record_worker_phase(name, phase);
            return Ok(LineOutcome::Applied);
        }

        if let Some(f) = self.sub_phase.captures(line.body) {
            let name = f.text(1).unwrap_or_default().trim();
            let duration_ms = f.decimal(2, "phase_duration")?;
            let Some(handle) = ctx.target(line.gc_id) else {
                return Ok(LineOutcome::Ignored(IgnoreReason::NoTargetEvent));
            };
            let event = ctx.event_mut(handle);
            event.phases.record_sub_phase(name, duration_ms);
            if name == EVACUATION_FAILURE_PHASE {
                event.flags.evacuation_failure = true;
            }
            return Ok(LineOutcome::Applied);
        }

        Ok(LineOutcome::UNRECOGNIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::line::tokenize;

    fn feed(handler: &mut PhaseHandler, ctx: &mut ParseContext, raw: &str) -> Result<LineOutcome, FieldError> {
        let line = tokenize(1, raw).unwrap();
        handler.handle(&line, ctx)
    }

    #[test]
    fn test_worker_phase_recorded() {
        let mut handler = PhaseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(3).unwrap();
        feed(
            &mut handler,
            &mut ctx,
            "[1.0s][debug][gc,phases] GC(3)       Object Copy (ms):   Min:  1.0, Avg:  2.5, Max:  4.0, Diff:  3.0, Sum: 20.0, Workers: 8",
        )
        .unwrap();
        let phases = &ctx.event(handle).phases;
        assert_eq!(phases.object_copy_ms, Some(2.5));
        assert_eq!(phases.worker_phases["Object Copy"].workers, 8);
    }

    #[test]
    fn test_sub_phase_recorded() {
        let mut handler = PhaseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(3).unwrap();
        feed(&mut handler, &mut ctx, "GC(3)   Post Evacuate Collection Set: 0.5ms").unwrap();
        feed(&mut handler, &mut ctx, "GC(3)   Other: 0.2ms").unwrap();
        let phases = &ctx.event(handle).phases;
        assert_eq!(phases.post_evacuate_ms, Some(0.5));
        assert_eq!(phases.other_ms, Some(0.2));
    }

    #[test]
    fn test_evacuation_failure_phase_sets_flag() {
        let mut handler = PhaseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(3).unwrap();
        feed(&mut handler, &mut ctx, "GC(3)     Evacuation Failure: 3.1ms").unwrap();
        assert!(ctx.event(handle).flags.evacuation_failure);
    }

    #[test]
    fn test_phase_after_finalization_ignored() {
        let mut handler = PhaseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        ctx.open_pause(3).unwrap();
        ctx.finalize_pause(3, Default::default()).unwrap();
        assert_eq!(
            feed(&mut handler, &mut ctx, "Other: 0.2ms").unwrap(),
            LineOutcome::Ignored(IgnoreReason::NoTargetEvent)
        );
    }
}
