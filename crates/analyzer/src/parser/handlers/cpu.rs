use crate::event::CpuTimes;
use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, IgnoreReason, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

/// `User=Xs Sys=Ys Real=Zs`, the terminal line of a pause.
pub struct CpuHandler {
    times: Recognizer,
}

impl CpuHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            times: Recognizer::new("cpu_times", Patterns::CPU_TIMES)?,
        })
    }
}

impl LineHandler for CpuHandler {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        let Some(f) = self.times.captures(line.body) else {
            return Ok(LineOutcome::UNRECOGNIZED);
        };
        let cpu = CpuTimes {
            user_secs: f.decimal(1, "cpu_user")?,
            sys_secs: f.decimal(2, "cpu_sys")?,
            real_secs: f.decimal(3, "cpu_real")?,
        };
        let Some(id) = line.gc_id else {
            return Ok(LineOutcome::Ignored(IgnoreReason::MissingCycleId));
        };
        // Concurrent-cycle pauses (Remark, Cleanup) end here too; no active entry, not an error
        Ok(ctx.finalize_pause(id, cpu).into())
    }
}
