use tracing::debug;

use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

/// Init lines (version, region size, heap capacities, worker counts).
///
/// These are printed once before any GC activity, so the handler switches
/// itself off for good after the heap-max line.
pub struct ConfigHandler {
    version: Recognizer,
    region_size: Recognizer,
    heap_max: Recognizer,
    heap_initial: Recognizer,
    parallel_workers: Recognizer,
    concurrent_workers: Recognizer,
    done: bool,
}

impl ConfigHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            version: Recognizer::new("version", Patterns::VERSION)?,
            region_size: Recognizer::new("region_size", Patterns::REGION_SIZE)?,
            heap_max: Recognizer::new("heap_max", Patterns::HEAP_MAX)?,
            heap_initial: Recognizer::new("heap_initial", Patterns::HEAP_INITIAL)?,
            parallel_workers: Recognizer::new("parallel_workers", Patterns::PARALLEL_WORKERS)?,
            concurrent_workers: Recognizer::new("concurrent_workers", Patterns::CONCURRENT_WORKERS)?,
            done: false,
        })
    }
}

impl LineHandler for ConfigHandler {
    fn name(&self) -> &'static str {
        "config"
    }

    fn is_enabled(&self) -> bool {
        !self.done
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        if line.gc_id.is_some() {
            return Ok(LineOutcome::UNRECOGNIZED);
        }
        let body = line.body;

        if let Some(f) = self.heap_max.captures(body) {
            ctx.heap_mut().heap_max = Some(f.size(1, "heap_max")?);
            self.done = true;
            debug!("Heap max capacity seen at line {}; config handler disabled", line.number);
            return Ok(LineOutcome::Applied);
        }
        if let Some(f) = self.region_size.captures(body) {
            ctx.heap_mut().region_size = Some(f.size(1, "region_size")?);
            return Ok(LineOutcome::Applied);
        }
        if let Some(f) = self.heap_initial.captures(body) {
            ctx.heap_mut().heap_initial = Some(f.size(1, "heap_initial")?);
            return Ok(LineOutcome::Applied);
        }
        if let Some(f) = self.parallel_workers.captures(body) {
            ctx.heap_mut().parallel_workers = Some(f.number(1, "parallel_workers")?);
            return Ok(LineOutcome::Applied);
        }
        if let Some(f) = self.concurrent_workers.captures(body) {
            ctx.heap_mut().concurrent_workers = Some(f.number(1, "concurrent_workers")?);
            return Ok(LineOutcome::Applied);
        }
        if let Some(f) = self.version.captures(body) {
            ctx.heap_mut().version = f.text(1).map(str::to_string);
            return Ok(LineOutcome::Applied);
        }

        Ok(LineOutcome::UNRECOGNIZED)
    }
}
