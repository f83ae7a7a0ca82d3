use super::context::ParseContext;
use super::line::LogLine;
use super::model::{FieldError, LineOutcome};

/// One line grammar family. Handlers are offered every line in a fixed
/// priority order and apply it only if their recognizer matches.
pub trait LineHandler {
    fn name(&self) -> &'static str;

    /// A disabled handler is skipped by the dispatcher for the rest of the pass.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Apply `line` to the parse state.
    ///
    /// `Ok(Ignored(Unrecognized))` when the shape does not match,
    /// `Err` when it matches but a field cannot be read.
    fn handle(&mut self, line: &LogLine<'_>, ctx: &mut ParseContext) -> Result<LineOutcome, FieldError>;
}
