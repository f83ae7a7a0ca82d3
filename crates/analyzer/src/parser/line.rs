//! Line tokenizer: strips unified-logging decorations and the `GC(n)` prefix.
//!
//! Handles decorations like:
//! - `[0.015s]` / `[15ms]` / `[15000ns]` (JVM uptime)
//! - `[2024-01-15T10:30:45.123+0000]` (wall clock)
//! - `[info]`, `[gc,heap     ]`, `[12345]` (level, tags, pid; skipped)

use chrono::{DateTime, FixedOffset};

use super::model::FieldError;

/// One input line split into its timing decorations, cycle ID and message body.
#[derive(Debug, Clone)]
pub struct LogLine<'a> {
    /// 1-based line number
    pub number: usize,
    pub raw: &'a str,
    /// Uptime seconds, or wall clock as epoch seconds when no uptime is printed
    pub timestamp: Option<f64>,
    pub wall_time: Option<DateTime<FixedOffset>>,
    pub gc_id: Option<u32>,
    /// Message text after decorations and `GC(n)`, trimmed
    pub body: &'a str,
}

impl<'a> LogLine<'a> {
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// Split a raw line into a [`LogLine`].
pub fn tokenize(number: usize, raw: &str) -> Result<LogLine<'_>, FieldError> {
    let mut rest = raw.trim_start();
    let mut uptime = None;
    let mut wall_time = None;

    while let Some(after) = rest.strip_prefix('[') {
        let Some(close) = after.find(']') else { break };
        let inner = after[..close].trim();
        match classify_decoration(inner)? {
            Decoration::Uptime(secs) => uptime = Some(secs),
            Decoration::Wall(time) => wall_time = Some(time),
            Decoration::Other => {}
        }
        rest = after[close + 1..].trim_start();
    }

    let (gc_id, body) = split_cycle_id(rest)?;

    let timestamp = uptime.or_else(|| {
        wall_time.map(|t: DateTime<FixedOffset>| t.timestamp_millis() as f64 / 1000.0)
    });

    Ok(LogLine {
        number,
        raw,
        timestamp,
        wall_time,
        gc_id,
        body: body.trim(),
    })
}

enum Decoration {
    Uptime(f64),
    Wall(DateTime<FixedOffset>),
    Other,
}

fn classify_decoration(inner: &str) -> Result<Decoration, FieldError> {
    // Order matters: "ms" and "ns" also end in 's'
    for (suffix, scale) in [("ns", 1e-9), ("ms", 1e-3), ("s", 1.0)] {
        if let Some(number) = inner.strip_suffix(suffix) {
            if is_decimal(number) {
                let value: f64 = number
                    .replace(',', ".")
                    .parse()
                    .map_err(|_| FieldError::InvalidTimestamp(inner.to_string()))?;
                return Ok(Decoration::Uptime(value * scale));
            }
        }
    }

    if looks_like_date(inner) {
        return parse_wall_time(inner).map(Decoration::Wall);
    }

    Ok(Decoration::Other)
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty()
        && text.as_bytes()[0].is_ascii_digit()
        && text.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b',')
}

fn looks_like_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

fn parse_wall_time(text: &str) -> Result<DateTime<FixedOffset>, FieldError> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map_err(|_| FieldError::InvalidTimestamp(text.to_string()))
}

fn split_cycle_id(text: &str) -> Result<(Option<u32>, &str), FieldError> {
    let Some(after) = text.strip_prefix("GC(") else {
        return Ok((None, text));
    };
    let Some(close) = after.find(')') else {
        return Ok((None, text));
    };
    let digits = &after[..close];
    let id = digits.parse::<u32>().map_err(|_| FieldError::InvalidNumber {
        field: "gc_id",
        value: digits.to_string(),
    })?;
    Ok((Some(id), &after[close + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_decoration() {
        let line = tokenize(1, "[1.234s][info][gc] GC(3) Pause Young (Normal) (G1 Evacuation Pause) 24M->5M(256M) 6.123ms").unwrap();
        assert_eq!(line.timestamp, Some(1.234));
        assert_eq!(line.gc_id, Some(3));
        assert!(line.body.starts_with("Pause Young"));
    }

    #[test]
    fn test_uptime_millis_decoration() {
        let line = tokenize(1, "[1500ms][info][gc,heap] GC(0) Eden regions: 1->0(2)").unwrap();
        assert_eq!(line.timestamp, Some(1.5));
        assert_eq!(line.body, "Eden regions: 1->0(2)");
    }

    #[test]
    fn test_wall_time_decoration_only() {
        let line = tokenize(1, "[2024-01-15T10:30:45.500+0000][info][gc] GC(1) Concurrent Mark Cycle").unwrap();
        let wall = line.wall_time.expect("wall time parsed");
        assert_eq!(line.timestamp, Some(wall.timestamp_millis() as f64 / 1000.0));
        assert_eq!(line.gc_id, Some(1));
    }

    #[test]
    fn test_uptime_preferred_over_wall_time() {
        let line = tokenize(1, "[2024-01-15T10:30:45.500+0000][3.000s][info][gc] Using G1").unwrap();
        assert_eq!(line.timestamp, Some(3.0));
        assert!(line.wall_time.is_some());
        assert_eq!(line.gc_id, None);
        assert_eq!(line.body, "Using G1");
    }

    #[test]
    fn test_no_decorations() {
        let line = tokenize(7, "GC(3) User=0.01s Sys=0.00s Real=0.01s").unwrap();
        assert_eq!(line.number, 7);
        assert_eq!(line.timestamp, None);
        assert_eq!(line.gc_id, Some(3));
        assert_eq!(line.body, "User=0.01s Sys=0.00s Real=0.01s");
    }

    #[test]
    fn test_tag_and_pid_decorations_skipped() {
        let line = tokenize(1, "[0.5s][12345][info ][gc,phases   ] GC(0)   Other: 0.3ms").unwrap();
        assert_eq!(line.timestamp, Some(0.5));
        assert_eq!(line.body, "Other: 0.3ms");
    }

    #[test]
    fn test_malformed_wall_time_is_fatal() {
        assert!(tokenize(1, "[2024-13-45Tbad][info][gc] hello").is_err());
    }

    #[test]
    fn test_malformed_cycle_id_is_fatal() {
        let err = tokenize(1, "[0.1s] GC(abc) Pause Young").unwrap_err();
        assert!(matches!(err, FieldError::InvalidNumber { field: "gc_id", .. }));
    }

    #[test]
    fn test_blank_line() {
        let line = tokenize(1, "   ").unwrap();
        assert!(line.is_blank());
        assert_eq!(line.body, "");
    }
}
