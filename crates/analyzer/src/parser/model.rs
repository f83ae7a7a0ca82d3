use serde::Serialize;
use thiserror::Error;

/// A recognized line shape carried a field that could not be interpreted. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid size in {field}: {value:?}")]
    InvalidSize { field: &'static str, value: String },

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Fatal parse failure with its position in the input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse failed at line {line}: {source} (line: {content:?})")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// Raw line text as read
    pub content: String,
    #[source]
    pub source: FieldError,
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid recognizer pattern {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Why a line (or a handler's view of it) produced no change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Empty or whitespace-only line
    Blank,
    /// No recognizer matched
    Unrecognized,
    /// Shape requires a `GC(n)` prefix and the line had none
    MissingCycleId,
    /// The ID belongs to a concurrent cycle and cannot be read as a pause
    ConcurrentCycleId,
    /// The ID belongs to a pause and cannot start a concurrent cycle
    PauseCycleId,
    /// The event for this ID was already finalized
    AlreadyFinalized,
    /// Terminal line for an ID with no in-progress event
    NoActiveEvent,
    /// Detail line with nothing open to attach to
    NoTargetEvent,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::Blank => "blank",
            IgnoreReason::Unrecognized => "unrecognized",
            IgnoreReason::MissingCycleId => "missing_cycle_id",
            IgnoreReason::ConcurrentCycleId => "concurrent_cycle_id",
            IgnoreReason::PauseCycleId => "pause_cycle_id",
            IgnoreReason::AlreadyFinalized => "already_finalized",
            IgnoreReason::NoActiveEvent => "no_active_event",
            IgnoreReason::NoTargetEvent => "no_target_event",
        }
    }
}

/// Non-fatal result of offering a line to a handler (or to the whole dispatcher).
///
/// The fatal arm travels as `Err(FieldError)` alongside this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Applied,
    Ignored(IgnoreReason),
}

impl LineOutcome {
    pub const UNRECOGNIZED: LineOutcome = LineOutcome::Ignored(IgnoreReason::Unrecognized);

    pub fn is_applied(&self) -> bool {
        matches!(self, LineOutcome::Applied)
    }

    /// Combine two handlers' outcomes for the same line.
    ///
    /// Any application wins; otherwise a specific reason beats `Unrecognized`.
    pub fn merge(self, other: LineOutcome) -> LineOutcome {
        match (self, other) {
            (LineOutcome::Applied, _) | (_, LineOutcome::Applied) => LineOutcome::Applied,
            (LineOutcome::Ignored(IgnoreReason::Unrecognized), other) => other,
            (this, _) => this,
        }
    }
}

impl<T> From<Result<T, IgnoreReason>> for LineOutcome {
    fn from(result: Result<T, IgnoreReason>) -> Self {
        match result {
            Ok(_) => LineOutcome::Applied,
            Err(reason) => LineOutcome::Ignored(reason),
        }
    }
}
