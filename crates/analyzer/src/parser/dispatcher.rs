use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::error::AnalyzerError;
use crate::event::GcEvent;

use super::context::{HeapConfig, ParseContext};
use super::handlers::default_handlers;
use super::line::{tokenize, LogLine};
use super::model::{FieldError, IgnoreReason, LineOutcome, ParseError, PatternError};
use super::traits::LineHandler;

/// Offers each line to every enabled handler in priority order.
///
/// Handler order matters only for readability of the outcome: shapes are
/// disjoint, so at most one handler applies a given line.
pub struct Dispatcher {
    handlers: Vec<Box<dyn LineHandler>>,
}

impl Dispatcher {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self::with_handlers(default_handlers()?))
    }

    pub fn with_handlers(handlers: Vec<Box<dyn LineHandler>>) -> Self {
        Self { handlers }
    }

    pub fn dispatch(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        ctx.observe_time(line);
        if line.is_blank() {
            return Ok(LineOutcome::Ignored(IgnoreReason::Blank));
        }

        let mut outcome = LineOutcome::UNRECOGNIZED;
        for handler in self.handlers.iter_mut() {
            if !handler.is_enabled() {
                continue;
            }
            let result = handler.handle(line, ctx)?;
            if result != LineOutcome::UNRECOGNIZED {
                trace!(line = line.number, handler = handler.name(), ?result, "line handled");
            }
            outcome = outcome.merge(result);
        }
        Ok(outcome)
    }
}

/// Line accounting for one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines_read: usize,
    pub lines_applied: usize,
    pub ignored: BTreeMap<IgnoreReason, usize>,
    pub unfinalized_pauses: usize,
    pub unfinished_concurrent: usize,
}

impl ParseStats {
    fn record(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Applied => self.lines_applied += 1,
            LineOutcome::Ignored(reason) => *self.ignored.entry(reason).or_insert(0) += 1,
        }
    }

    pub fn lines_ignored(&self) -> usize {
        self.ignored.values().sum()
    }

    pub fn ignored_for(&self, reason: IgnoreReason) -> usize {
        self.ignored.get(&reason).copied().unwrap_or(0)
    }
}

/// Output of a completed parse: the ordered, fully finalized event sequence.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub events: Vec<GcEvent>,
    pub heap: HeapConfig,
    pub stats: ParseStats,
}

/// Parse a complete G1 log.
///
/// Input that is not valid UTF-8 is read lossily. The first line with a
/// recognized shape but an unreadable field aborts the parse.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<ParsedLog, AnalyzerError> {
    let mut dispatcher = Dispatcher::new()?;
    let mut ctx = ParseContext::new();
    let mut stats = ParseStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| AnalyzerError::Read {
                line: stats.lines_read + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        stats.lines_read += 1;
        let number = stats.lines_read;

        let text = String::from_utf8_lossy(&buf);
        let raw = text.trim_end_matches(&['\n', '\r'][..]);

        let outcome = tokenize(number, raw)
            .and_then(|line| dispatcher.dispatch(&line, &mut ctx))
            .map_err(|source| ParseError {
                line: number,
                content: raw.to_string(),
                source,
            })?;
        stats.record(outcome);
    }

    let assembled = ctx.finish();
    stats.unfinalized_pauses = assembled.unfinalized_pauses;
    stats.unfinished_concurrent = assembled.unfinished_concurrent;

    for (reason, count) in &stats.ignored {
        debug!("Ignored {} line(s): {}", count, reason.as_str());
    }
    info!(
        "Parsed {} lines: {} events, {} applied, {} ignored",
        stats.lines_read,
        assembled.events.len(),
        stats.lines_applied,
        stats.lines_ignored()
    );

    Ok(ParsedLog {
        events: assembled.events,
        heap: assembled.heap,
        stats,
    })
}
