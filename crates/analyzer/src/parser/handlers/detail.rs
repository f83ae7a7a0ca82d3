use crate::event::MetaspaceUsage;
use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, IgnoreReason, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

/// Remaining per-cycle detail: worker usage, metaspace, to-space exhaustion.
pub struct DetailHandler {
    workers: Recognizer,
    metaspace: Recognizer,
    to_space: Recognizer,
}

impl DetailHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            workers: Recognizer::new("workers_used", Patterns::WORKERS_USED)?,
            metaspace: Recognizer::new("metaspace", Patterns::METASPACE)?,
            to_space: Recognizer::new("to_space_exhausted", Patterns::TO_SPACE_EXHAUSTED)?,
        })
    }
}

impl LineHandler for DetailHandler {
    fn name(&self) -> &'static str {
        "detail"
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        if let Some(f) = self.workers.captures(line.body) {
            let used: u32 = f.number(1, "workers_used")?;
            let available: u32 = f.number(2, "workers_available")?;
            let Some(handle) = ctx.target(line.gc_id) else {
                return Ok(LineOutcome::Ignored(IgnoreReason::NoTargetEvent));
            };
            let workers = &mut ctx.event_mut(handle).workers;
            workers.used = Some(used);
            workers.available = Some(available);
            return Ok(LineOutcome::Applied);
        }

        if let Some(f) = self.metaspace.captures(line.body) {
            let usage = MetaspaceUsage {
                used_before: f.size(1, "metaspace_used_before")?,
                committed_before: f.optional_size(2, "metaspace_committed_before")?,
                used_after: f.size(3, "metaspace_used_after")?,
                capacity_after: f.size(4, "metaspace_capacity_after")?,
            };
            let Some(handle) = ctx.target(line.gc_id) else {
                return Ok(LineOutcome::Ignored(IgnoreReason::NoTargetEvent));
            };
            ctx.event_mut(handle).metaspace = Some(usage);
            return Ok(LineOutcome::Applied);
        }

        if self.to_space.is_match(line.body) {
            let Some(handle) = ctx.target(line.gc_id) else {
                return Ok(LineOutcome::Ignored(IgnoreReason::NoTargetEvent));
            };
            ctx.event_mut(handle).flags.evacuation_failure = true;
            return Ok(LineOutcome::Applied);
        }

        Ok(LineOutcome::UNRECOGNIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::line::tokenize;

    fn feed(handler: &mut DetailHandler, ctx: &mut ParseContext, raw: &str) -> LineOutcome {
        let line = tokenize(1, raw).unwrap();
        handler.handle(&line, ctx).unwrap()
    }

    #[test]
    fn test_workers_used() {
        let mut handler = DetailHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(2).unwrap();
        feed(&mut handler, &mut ctx, "GC(2) Using 6 workers of 8 for evacuation");
        let workers = ctx.event(handle).workers;
        assert_eq!((workers.used, workers.available), (Some(6), Some(8)));
    }

    #[test]
    fn test_metaspace() {
        let mut handler = DetailHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(2).unwrap();
        feed(&mut handler, &mut ctx, "GC(2) Metaspace: 3627K->3627K(1056768K)");
        let metaspace = ctx.event(handle).metaspace.unwrap();
        assert_eq!(metaspace.used_after, 3627 * 1024);
        assert_eq!(metaspace.committed_before, None);
    }

    #[test]
    fn test_to_space_exhausted_sets_flag() {
        let mut handler = DetailHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let handle = ctx.open_pause(2).unwrap();
        assert!(feed(&mut handler, &mut ctx, "GC(2) To-space exhausted").is_applied());
        assert!(ctx.event(handle).flags.evacuation_failure);
    }

    #[test]
    fn test_unrelated_line() {
        let mut handler = DetailHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        assert_eq!(feed(&mut handler, &mut ctx, "GC(2) Something else"), LineOutcome::UNRECOGNIZED);
    }
}
