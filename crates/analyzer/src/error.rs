use thiserror::Error;

use crate::conf::ConfigError;
use crate::parser::{ParseError, PatternError};

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
