//! Pause start and pause summary lines.

use crate::event::{GcCategory, HeapUsage};
use crate::parser::context::ParseContext;
use crate::parser::line::LogLine;
use crate::parser::model::{FieldError, IgnoreReason, LineOutcome, PatternError};
use crate::parser::patterns::{Patterns, Recognizer};
use crate::parser::traits::LineHandler;

/// Clauses that name what triggered the collection.
const CAUSE_KEYWORDS: &[&str] = &[
    "G1 Evacuation Pause",
    "G1 Humongous Allocation",
    "G1 Compaction Pause",
    "G1 Preventive Collection",
    "G1 Periodic Collection",
    "System.gc()",
    "Allocation Failure",
    "Metadata GC Threshold",
    "GCLocker Initiated GC",
    "Heap Dump Initiated GC",
    "WhiteBox Initiated",
    "Diagnostic Command",
];

/// What a pause description (`Pause Young (Normal) (G1 Evacuation Pause)`) says.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub category: GcCategory,
    pub subtype: Option<String>,
    pub cause: Option<String>,
    pub evacuation_failure: bool,
}

/// Resolve a pause description into its category, subtype and cause.
pub fn classify(description: &str) -> Classification {
    let rest = description.trim_start().strip_prefix("Pause").unwrap_or(description).trim_start();
    let (token, clauses) = match rest.find(|c: char| c.is_whitespace() || c == '(') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };

    let mut result = Classification {
        category: match token {
            "Young" => GcCategory::Young,
            "Mixed" => GcCategory::Mixed,
            "Full" => GcCategory::Full,
            _ => GcCategory::Unknown,
        },
        ..Classification::default()
    };

    for clause in split_clauses(clauses) {
        if clause.eq_ignore_ascii_case("mixed") {
            result.category = GcCategory::Mixed;
        } else if clause.starts_with("Evacuation Failure") {
            result.evacuation_failure = true;
        } else if CAUSE_KEYWORDS.iter().any(|k| clause.contains(k)) {
            result.cause.get_or_insert_with(|| clause.to_string());
        } else if !clause.is_empty() {
            result.subtype.get_or_insert_with(|| clause.to_string());
        }
    }

    // Remark / Cleanup carry no clause; the token is the only description
    if result.category == GcCategory::Unknown && result.subtype.is_none() && !token.is_empty() {
        result.subtype = Some(token.to_string());
    }
    result
}

/// Top-level `( ... )` groups, honouring nesting so `(System.gc())` stays whole.
fn split_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    clauses.push(text[start..i].trim());
                }
            }
            _ => {}
        }
    }
    clauses
}

pub struct PauseHandler {
    summary: Recognizer,
    start: Recognizer,
}

impl PauseHandler {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            summary: Recognizer::new("pause_summary", Patterns::PAUSE_SUMMARY)?,
            start: Recognizer::new("pause_start", Patterns::PAUSE_START)?,
        })
    }

    fn apply(
        ctx: &mut ParseContext,
        id: u32,
        classification: Classification,
        sizes: Option<(HeapUsage, f64)>,
    ) -> Result<(), IgnoreReason> {
        let handle = ctx.open_pause(id)?;
        let event = ctx.event_mut(handle);
        event.category = classification.category;
        if classification.subtype.is_some() {
            event.subtype = classification.subtype;
        }
        if classification.cause.is_some() {
            event.cause = classification.cause;
        }
        if classification.evacuation_failure {
            event.flags.evacuation_failure = true;
        }
        if let Some((heap, duration_ms)) = sizes {
            event.heap = Some(heap);
            event.duration_ms = duration_ms;
        }
        Ok(())
    }
}

impl LineHandler for PauseHandler {
    fn name(&self) -> &'static str {
        "pause"
    }

    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError> {
        if let Some(f) = self.summary.captures(line.body) {
            let heap = HeapUsage {
                before: f.size(2, "heap_before")?,
                after: f.size(3, "heap_after")?,
                total: f.size(4, "heap_total")?,
            };
            let duration_ms = f.decimal(5, "duration")?;
            let Some(id) = line.gc_id else {
                return Ok(LineOutcome::Ignored(IgnoreReason::MissingCycleId));
            };
            let classification = classify(f.text(1).unwrap_or_default());
            return Ok(Self::apply(ctx, id, classification, Some((heap, duration_ms))).into());
        }

        if let Some(f) = self.start.captures(line.body) {
            let Some(id) = line.gc_id else {
                return Ok(LineOutcome::Ignored(IgnoreReason::MissingCycleId));
            };
            let classification = classify(f.text(1).unwrap_or_default());
            return Ok(Self::apply(ctx, id, classification, None).into());
        }

        Ok(LineOutcome::UNRECOGNIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::line::tokenize;
    use crate::parser::units::MB;

    fn feed(handler: &mut PauseHandler, ctx: &mut ParseContext, raw: &str) -> Result<LineOutcome, FieldError> {
        let line = tokenize(1, raw).unwrap();
        ctx.observe_time(&line);
        handler.handle(&line, ctx)
    }

    #[test]
    fn test_classify_young_normal() {
        let c = classify("Pause Young (Normal) (G1 Evacuation Pause)");
        assert_eq!(c.category, GcCategory::Young);
        assert_eq!(c.subtype.as_deref(), Some("Normal"));
        assert_eq!(c.cause.as_deref(), Some("G1 Evacuation Pause"));
        assert!(!c.evacuation_failure);
    }

    #[test]
    fn test_classify_mixed_clause_overrides_token() {
        let c = classify("Pause Young (Mixed) (G1 Evacuation Pause)");
        assert_eq!(c.category, GcCategory::Mixed);
        assert_eq!(c.subtype, None);
    }

    #[test]
    fn test_classify_nested_parentheses() {
        let c = classify("Pause Full (System.gc())");
        assert_eq!(c.category, GcCategory::Full);
        assert_eq!(c.cause.as_deref(), Some("System.gc()"));
    }

    #[test]
    fn test_classify_evacuation_failure_clause() {
        let c = classify("Pause Young (Normal) (G1 Evacuation Pause) (Evacuation Failure)");
        assert!(c.evacuation_failure);
        assert_eq!(c.subtype.as_deref(), Some("Normal"));
    }

    #[test]
    fn test_classify_evacuation_failure_with_reason() {
        let c = classify("Pause Young (Normal) (G1 Evacuation Pause) (Evacuation Failure: Pinned)");
        assert!(c.evacuation_failure);
        assert_eq!(c.subtype.as_deref(), Some("Normal"));
        assert_eq!(c.cause.as_deref(), Some("G1 Evacuation Pause"));
    }

    #[test]
    fn test_classify_remark_is_unknown() {
        let c = classify("Pause Remark");
        assert_eq!(c.category, GcCategory::Unknown);
        assert_eq!(c.subtype.as_deref(), Some("Remark"));
    }

    #[test]
    fn test_summary_creates_event() {
        let mut handler = PauseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let outcome = feed(
            &mut handler,
            &mut ctx,
            "[1.000s][info][gc] GC(3) Pause Young (Normal) (G1 Evacuation Pause) 100M->50M(256M) 10.0ms",
        )
        .unwrap();
        assert!(outcome.is_applied());
        let event = &ctx.events()[0];
        assert_eq!(event.id, 3);
        assert_eq!(event.category, GcCategory::Young);
        assert_eq!(event.heap, Some(HeapUsage { before: 100 * MB, after: 50 * MB, total: 256 * MB }));
        assert_eq!(event.duration_ms, 10.0);
        assert_eq!(event.timestamp, 1.0);
    }

    #[test]
    fn test_start_then_summary_is_one_event() {
        let mut handler = PauseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        feed(&mut handler, &mut ctx, "[2.000s] GC(4) Pause Young (Concurrent Start) (G1 Humongous Allocation)").unwrap();
        feed(
            &mut handler,
            &mut ctx,
            "[2.010s] GC(4) Pause Young (Concurrent Start) (G1 Humongous Allocation) 80M->60M(256M) 4.5ms",
        )
        .unwrap();
        assert_eq!(ctx.events().len(), 1);
        let event = &ctx.events()[0];
        assert_eq!(event.timestamp, 2.0);
        assert_eq!(event.subtype.as_deref(), Some("Concurrent Start"));
        assert_eq!(event.cause.as_deref(), Some("G1 Humongous Allocation"));
    }

    #[test]
    fn test_summary_without_id_is_ignored() {
        let mut handler = PauseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let outcome = feed(&mut handler, &mut ctx, "Pause Young (Normal) (G1 Evacuation Pause) 10M->5M(20M) 1.0ms").unwrap();
        assert_eq!(outcome, LineOutcome::Ignored(IgnoreReason::MissingCycleId));
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_malformed_size_is_fatal_before_state_changes() {
        let mut handler = PauseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        let result = feed(&mut handler, &mut ctx, "GC(1) Pause Young (Normal) (G1 Evacuation Pause) 1.2.3M->5M(20M) 1.0ms");
        assert!(matches!(result, Err(FieldError::InvalidSize { field: "heap_before", .. })));
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_concurrent_id_rejected() {
        let mut handler = PauseHandler::new().unwrap();
        let mut ctx = ParseContext::new();
        ctx.start_concurrent(7).unwrap();
        let outcome = feed(&mut handler, &mut ctx, "GC(7) Pause Remark 20M->20M(256M) 1.2ms").unwrap();
        assert_eq!(outcome, LineOutcome::Ignored(IgnoreReason::ConcurrentCycleId));
        assert_eq!(ctx.events().len(), 1);
    }
}
