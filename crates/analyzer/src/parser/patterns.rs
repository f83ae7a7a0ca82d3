//! Pattern library: one recognizer per G1 line grammar.
//!
//! Patterns run against the line *body* (decorations and `GC(n)` already
//! stripped by [`super::line::tokenize`]). Numeric captures are loose
//! (`[0-9][0-9.]*`): a malformed number still matches its shape and surfaces
//! as a fatal [`FieldError`].

use std::str::FromStr;

use grep_matcher::{Captures, Matcher};
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

use super::model::{FieldError, PatternError};
use super::units::parse_size;

/// Line grammars, one per recognizer.
pub struct Patterns;

impl Patterns {
    pub const VERSION: &'static str = r"^Version:\s*(.+?)\s*$";

    pub const REGION_SIZE: &'static str = r"(?i)^heap region size:\s*(\S+)";

    pub const HEAP_MAX: &'static str = r"(?i)^heap max(?:imum)? capacity:\s*(\S+)";

    pub const HEAP_INITIAL: &'static str = r"(?i)^heap initial capacity:\s*(\S+)";

    pub const PARALLEL_WORKERS: &'static str = r"(?i)^parallel workers:\s*(\S+)";

    pub const CONCURRENT_WORKERS: &'static str = r"(?i)^concurrent workers:\s*(\S+)";

    /// `Pause Young (Normal) (G1 Evacuation Pause)` with no sizes (gc,start)
    pub const PAUSE_START: &'static str = r"^(Pause\s+[A-Za-z]+(?:\s+\(.*\))?)$";

    /// `Pause Young (Normal) (G1 Evacuation Pause) 24M->5M(256M) 6.123ms`
    pub const PAUSE_SUMMARY: &'static str = r"^(Pause\s+.*?)\s+([0-9][0-9.,]*[BKMGT]?)->([0-9][0-9.,]*[BKMGT]?)\(([0-9][0-9.,]*[BKMGT]?)\)\s+([0-9][0-9.,]*)ms$";

    pub const CPU_TIMES: &'static str = r"^User=([0-9][0-9.,]*)s\s+Sys=([0-9][0-9.,]*)s\s+Real=([0-9][0-9.,]*)s";

    /// `Ext Root Scanning (ms): Min: 0.1, Avg: 0.2, Max: 0.3, Diff: 0.2, Sum: 1.6, Workers: 8`
    pub const WORKER_PHASE: &'static str = r"^([A-Za-z][A-Za-z0-9 /-]*?)\s*\(ms\):\s*Min:\s*([0-9][0-9.,]*),\s*Avg:\s*([0-9][0-9.,]*),\s*Max:\s*([0-9][0-9.,]*),\s*Diff:\s*([0-9][0-9.,]*),\s*Sum:\s*([0-9][0-9.,]*),\s*Workers:\s*([0-9]+)";

    /// `Post Evacuate Collection Set: 0.5ms`
    pub const PHASE_TIME: &'static str = r"^([A-Za-z][A-Za-z0-9 /-]*?):\s*([0-9][0-9.,]*)ms$";

    /// `Eden regions: 24->0(20)`; the target is absent for Old/Humongous/Archive
    pub const REGION_TRANSITION: &'static str = r"^(Eden|Survivor|Old|Humongous|Archive)\s+regions:\s*([0-9][0-9.]*)->([0-9][0-9.]*)(?:\s*\(([0-9][0-9.]*)\))?";

    /// Start (no duration) or end (`... 712.345ms`) of a concurrent cycle
    pub const CONCURRENT_CYCLE: &'static str = r"^Concurrent (?:Mark|Undo) Cycle(?:\s+([0-9][0-9.,]*)ms)?$";

    pub const CONCURRENT_ABORT: &'static str = r"^Concurrent Mark Abort";

    pub const WORKERS_USED: &'static str = r"^Using ([0-9]+) workers of ([0-9]+) for (.+)$";

    /// JDK 17 `Metaspace: 1024K(1216K)->1030K(1216K) ...` and JDK 11 `Metaspace: 3627K->3627K(1056768K)`
    pub const METASPACE: &'static str = r"^Metaspace:\s*([0-9][0-9.,]*[BKMGT]?)(?:\(([0-9][0-9.,]*[BKMGT]?)\))?->([0-9][0-9.,]*[BKMGT]?)\(([0-9][0-9.,]*[BKMGT]?)\)";

    pub const TO_SPACE_EXHAUSTED: &'static str = r"^To-space exhausted";
}

/// A compiled line grammar.
pub struct Recognizer {
    matcher: RegexMatcher,
}

impl Recognizer {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, PatternError> {
        let matcher = RegexMatcherBuilder::new()
            .multi_line(false)
            .build(pattern)
            .map_err(|e| PatternError::Invalid {
                name,
                message: e.to_string(),
            })?;
        Ok(Self { matcher })
    }

    #[inline]
    pub fn is_match(&self, body: &str) -> bool {
        self.matcher.is_match(body.as_bytes()).unwrap_or(false)
    }

    /// Match `body` and return its capture groups, or `None` if the shape differs.
    pub fn captures<'h>(&self, body: &'h str) -> Option<Fields<'h>> {
        let mut caps = self.matcher.new_captures().ok()?;
        if !self
            .matcher
            .captures(body.as_bytes(), &mut caps)
            .unwrap_or(false)
        {
            return None;
        }
        let spans = (0..caps.len())
            .map(|i| caps.get(i).map(|m| (m.start(), m.end())))
            .collect();
        Some(Fields {
            haystack: body,
            spans,
        })
    }
}

/// Capture groups of one recognizer match, with typed accessors.
#[derive(Debug)]
pub struct Fields<'h> {
    haystack: &'h str,
    spans: Vec<Option<(usize, usize)>>,
}

impl<'h> Fields<'h> {
    /// Text of capture group `group` (1-based; 0 is the whole match).
    pub fn text(&self, group: usize) -> Option<&'h str> {
        self.spans
            .get(group)
            .copied()
            .flatten()
            .map(|(start, end)| &self.haystack[start..end])
    }

    pub fn number<T: FromStr>(&self, group: usize, field: &'static str) -> Result<T, FieldError> {
        let raw = self.text(group).unwrap_or_default();
        raw.trim().parse().map_err(|_| FieldError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
    }

    pub fn optional_number<T: FromStr>(
        &self,
        group: usize,
        field: &'static str,
    ) -> Result<Option<T>, FieldError> {
        match self.text(group) {
            Some(_) => self.number(group, field).map(Some),
            None => Ok(None),
        }
    }

    /// Decimal value, accepting `,` as the decimal separator (locale-dependent JVM output).
    pub fn decimal(&self, group: usize, field: &'static str) -> Result<f64, FieldError> {
        let raw = self.text(group).unwrap_or_default();
        let value: f64 = raw
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| FieldError::InvalidNumber {
                field,
                value: raw.to_string(),
            })?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FieldError::InvalidNumber {
                field,
                value: raw.to_string(),
            })
        }
    }

    pub fn optional_decimal(&self, group: usize, field: &'static str) -> Result<Option<f64>, FieldError> {
        match self.text(group) {
            Some(_) => self.decimal(group, field).map(Some),
            None => Ok(None),
        }
    }

    pub fn size(&self, group: usize, field: &'static str) -> Result<u64, FieldError> {
        parse_size(field, self.text(group).unwrap_or_default())
    }

    pub fn optional_size(&self, group: usize, field: &'static str) -> Result<Option<u64>, FieldError> {
        match self.text(group) {
            Some(raw) => parse_size(field, raw).map(Some),
            None => Ok(None),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer(pattern: &str) -> Recognizer {
        Recognizer::new("test", pattern).expect("pattern compiles")
    }

    #[test]
    fn test_all_patterns_compile() {
        for pattern in [
            Patterns::VERSION,
            Patterns::REGION_SIZE,
            Patterns::HEAP_MAX,
            Patterns::HEAP_INITIAL,
            Patterns::PARALLEL_WORKERS,
            Patterns::CONCURRENT_WORKERS,
            Patterns::PAUSE_START,
            Patterns::PAUSE_SUMMARY,
            Patterns::CPU_TIMES,
            Patterns::WORKER_PHASE,
            Patterns::PHASE_TIME,
            Patterns::REGION_TRANSITION,
            Patterns::CONCURRENT_CYCLE,
            Patterns::CONCURRENT_ABORT,
            Patterns::WORKERS_USED,
            Patterns::METASPACE,
            Patterns::TO_SPACE_EXHAUSTED,
        ] {
            assert!(Recognizer::new("p", pattern).is_ok(), "failed: {}", pattern);
        }
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Recognizer::new("bad", "[invalid").is_err());
    }

    #[test]
    fn test_pause_summary_captures() {
        let r = recognizer(Patterns::PAUSE_SUMMARY);
        let f = r
            .captures("Pause Young (Normal) (G1 Evacuation Pause) 100M->50M(256M) 10.0ms")
            .unwrap();
        assert_eq!(f.text(1), Some("Pause Young (Normal) (G1 Evacuation Pause)"));
        assert_eq!(f.size(2, "before").unwrap(), 100 << 20);
        assert_eq!(f.size(3, "after").unwrap(), 50 << 20);
        assert_eq!(f.size(4, "total").unwrap(), 256 << 20);
        assert_eq!(f.decimal(5, "duration").unwrap(), 10.0);
    }

    #[test]
    fn test_pause_summary_with_system_gc_cause() {
        let r = recognizer(Patterns::PAUSE_SUMMARY);
        let f = r.captures("Pause Full (System.gc()) 200M->50M(256M) 30.123ms").unwrap();
        assert_eq!(f.text(1), Some("Pause Full (System.gc())"));
    }

    #[test]
    fn test_pause_start_does_not_match_summary() {
        let start = recognizer(Patterns::PAUSE_START);
        assert!(start.is_match("Pause Young (Normal) (G1 Evacuation Pause)"));
        assert!(start.is_match("Pause Remark"));
        assert!(!start.is_match("Pause Young (Normal) (G1 Evacuation Pause) 24M->5M(256M) 6.123ms"));
    }

    #[test]
    fn test_worker_phase_captures() {
        let r = recognizer(Patterns::WORKER_PHASE);
        let f = r
            .captures("Ext Root Scanning (ms):   Min:  0.1, Avg:  0.2, Max:  0.3, Diff:  0.2, Sum:  1.6, Workers: 8")
            .unwrap();
        assert_eq!(f.text(1), Some("Ext Root Scanning"));
        assert_eq!(f.decimal(3, "avg").unwrap(), 0.2);
        assert_eq!(f.number::<u32>(7, "workers").unwrap(), 8);
    }

    #[test]
    fn test_phase_time_shapes() {
        let r = recognizer(Patterns::PHASE_TIME);
        let f = r.captures("Post Evacuate Collection Set: 0.5ms").unwrap();
        assert_eq!(f.text(1), Some("Post Evacuate Collection Set"));
        assert!(!r.is_match("Concurrent Mark From Roots 10.5ms"));
        assert!(!r.is_match("Pause Young (Normal) (G1 Evacuation Pause) 24M->5M(256M) 6.123ms"));
    }

    #[test]
    fn test_region_transition_optional_target() {
        let r = recognizer(Patterns::REGION_TRANSITION);
        let eden = r.captures("Eden regions: 24->0(20)").unwrap();
        assert_eq!(eden.optional_number::<u64>(4, "target").unwrap(), Some(20));
        let old = r.captures("Old regions: 2->5").unwrap();
        assert_eq!(old.text(1), Some("Old"));
        assert_eq!(old.optional_number::<u64>(4, "target").unwrap(), None);
    }

    #[test]
    fn test_concurrent_cycle_start_and_end() {
        let r = recognizer(Patterns::CONCURRENT_CYCLE);
        let start = r.captures("Concurrent Mark Cycle").unwrap();
        assert_eq!(start.optional_decimal(1, "duration").unwrap(), None);
        let end = r.captures("Concurrent Mark Cycle 712.345ms").unwrap();
        assert_eq!(end.optional_decimal(1, "duration").unwrap(), Some(712.345));
        assert!(!r.is_match("Concurrent Mark From Roots"));
    }

    #[test]
    fn test_metaspace_both_layouts() {
        let r = recognizer(Patterns::METASPACE);
        let jdk17 = r.captures("Metaspace: 1024K(1216K)->1030K(1216K) NonClass: 900K->900K").unwrap();
        assert_eq!(jdk17.optional_size(2, "committed").unwrap(), Some(1216 * 1024));
        let jdk11 = r.captures("Metaspace: 3627K->3627K(1056768K)").unwrap();
        assert_eq!(jdk11.optional_size(2, "committed").unwrap(), None);
        assert_eq!(jdk11.size(4, "reserved").unwrap(), 1056768 * 1024);
    }

    #[test]
    fn test_decimal_comma_and_malformed() {
        let r = recognizer(Patterns::CPU_TIMES);
        let f = r.captures("User=0,02s Sys=0.00s Real=0.01s").unwrap();
        assert_eq!(f.decimal(1, "user").unwrap(), 0.02);

        let bad = r.captures("User=0.0.2s Sys=0.00s Real=0.01s").unwrap();
        assert!(bad.decimal(1, "user").is_err());
    }
}
