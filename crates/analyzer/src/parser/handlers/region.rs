use crate::event::{RegionKind, RegionTransition};
use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, IgnoreReason, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

/// `<Kind> regions: before->after(target)`
pub struct RegionHandler {
    transition: Recognizer,
}

impl RegionHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            transition: Recognizer::new("region_transition", Patterns::REGION_TRANSITION)?,
        })
    }
}

impl LineHandler for RegionHandler {
    fn name(&self) -> &'static str {
        "region"
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        let Some(f) = self.transition.captures(line.body) else {
            return Ok(LineOutcome::UNRECOGNIZED);
        };
        let Some(kind) = f.text(1).and_then(RegionKind::from_label) else {
            return Ok(LineOutcome::UNRECOGNIZED);
        };
        let transition = RegionTransition::new(
            f.number(2, "regions_before")?,
            f.number(3, "regions_after")?,
            f.optional_number(4, "regions_target")?,
        );

        let Some(handle) = ctx.target(line.gc_id) else {
            return Ok(LineOutcome::Ignored(IgnoreReason::NoTargetEvent));
        };
        let region_size = ctx.heap().region_size;
        ctx.event_mut(handle).regions.set(kind, transition, region_size);
        Ok(LineOutcome::Applied)
    }
}
