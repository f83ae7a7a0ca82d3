/// G1 log parsing and event assembly
///
/// Reconstructs GC cycle events from unified-logging output. Lines for one
/// cycle are spread across the file and correlated by their `GC(n)` ID.
///
/// # Architecture
///
/// - `line.rs`: Decoration and cycle-ID tokenizer
/// - `patterns.rs`: Line grammars and typed capture access
/// - `handlers/`: One handler per line family (config, pause, cpu, ...)
/// - `context.rs`: Per-cycle state machine and event sequence
/// - `dispatcher.rs`: Line loop, outcome accounting, end-of-input finalization
/// - `units.rs`: Byte-size parsing and formatting
///
/// # Failure model
///
/// Every line yields `Applied`, `Ignored(reason)` or a fatal `FieldError`.
/// A fatal error aborts the parse with the offending line number and text.

pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod line;
pub mod model;
pub mod patterns;
pub mod traits;
pub mod units;

// Re-export commonly used types
pub use context::{EventHandle, HeapConfig, ParseContext};
pub use dispatcher::{parse_reader, Dispatcher, ParseStats, ParsedLog};
pub use model::{FieldError, IgnoreReason, LineOutcome, ParseError, PatternError};
pub use traits::LineHandler;
pub use units::{format_size, parse_size};
