use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, IgnoreReason, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

/// Concurrent mark/undo cycle start, end and abort.
pub struct ConcurrentHandler {
    cycle: Recognizer,
    abort: Recognizer,
}

impl ConcurrentHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            cycle: Recognizer::new("concurrent_cycle", Patterns::CONCURRENT_CYCLE)?,
            abort: Recognizer::new("concurrent_abort", Patterns::CONCURRENT_ABORT)?,
        })
    }
}

impl LineHandler for ConcurrentHandler {
    fn name(&self) -> &'static str {
        "concurrent"
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        if let Some(f) = self.cycle.captures(line.body) {
            let duration_ms = f.optional_decimal(1, "concurrent_duration")?;
            let Some(id) = line.gc_id else {
                return Ok(LineOutcome::Ignored(IgnoreReason::MissingCycleId));
            };
            return Ok(match duration_ms {
                Some(ms) => ctx.end_concurrent(id, ms).into(),
                None => ctx.start_concurrent(id).into(),
            });
        }

        if self.abort.is_match(line.body) {
            let Some(id) = line.gc_id else {
                return Ok(LineOutcome::Ignored(IgnoreReason::MissingCycleId));
            };
            return Ok(ctx.abort_concurrent(id).into());
        }

        Ok(LineOutcome::UNRECOGNIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::GcCategory;
    use crate::parser::line::tokenize;

    fn feed(handler: &mut ConcurrentHandler, ctx: &mut ParseContext, raw: &str) -> LineOutcome {
        let line = tokenize(1, raw).unwrap();
        handler.handle(&line, ctx).unwrap()
    }

    #[test]
    fn test_start_and_end() {
        let mut handler = ConcurrentHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        assert!(feed(&mut handler, &mut ctx, "GC(5) Concurrent Mark Cycle").is_applied());
        assert!(feed(&mut handler, &mut ctx, "GC(5) Concurrent Mark Cycle 712.345ms").is_applied());

        let event = &ctx.events()[0];
        assert_eq!(event.category, GcCategory::ConcurrentMark);
        assert_eq!(event.duration_ms, 712.345);
        assert!(event.finalized);
    }

    #[test]
    fn test_undo_cycle() {
        let mut handler = ConcurrentHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        feed(&mut handler, &mut ctx, "GC(6) Concurrent Undo Cycle");
        feed(&mut handler, &mut ctx, "GC(6) Concurrent Undo Cycle 0.5ms");
        assert_eq!(ctx.events().len(), 1);
    }

    #[test]
    fn test_abort_marks_event() {
        let mut handler = ConcurrentHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        feed(&mut handler, &mut ctx, "GC(7) Concurrent Mark Cycle");
        assert!(feed(&mut handler, &mut ctx, "GC(7) Concurrent Mark Abort").is_applied());
        let event = &ctx.events()[0];
        assert_eq!(event.category, GcCategory::ConcurrentAbort);
        assert!(event.aborted);
        assert!(!event.finalized);
    }

    #[test]
    fn test_end_without_start() {
        let mut handler = ConcurrentHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        assert_eq!(
            feed(&mut handler, &mut ctx, "GC(8) Concurrent Mark Cycle 10.0ms"),
            LineOutcome::Ignored(IgnoreReason::NoActiveEvent)
        );
    }

    #[test]
    fn test_phase_lines_not_cycle() {
        let mut handler = ConcurrentHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        assert_eq!(
            feed(&mut handler, &mut ctx, "GC(5) Concurrent Mark From Roots"),
            LineOutcome::UNRECOGNIZED
        );
    }
}
