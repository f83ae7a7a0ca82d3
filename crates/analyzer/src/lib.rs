// G1 GC log analyzer: parse, assemble events, aggregate, detect trends.

// Core infrastructure
pub mod error;
pub mod parser;
pub mod conf;

// Domain modules
pub mod event;
pub mod analysis;
pub mod runtime;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::analysis::GcAnalysis;
use crate::conf::Thresholds;
use crate::event::GcEvent;
use crate::parser::{HeapConfig, ParseStats};

pub use error::AnalyzerError;

/// Result of analysing one log: the ordered events and everything derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub events: Vec<GcEvent>,
    pub analysis: GcAnalysis,
    pub heap: HeapConfig,
    pub stats: ParseStats,
}

/// Parse and analyse a G1 log file.
pub fn parse_file<P: AsRef<Path>>(path: P, thresholds: &Thresholds) -> Result<Report, AnalyzerError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AnalyzerError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Analyzing {}", path.display());
    analyze_reader(BufReader::new(file), thresholds)
}

/// Parse and analyse any buffered source.
pub fn analyze_reader<R: BufRead>(reader: R, thresholds: &Thresholds) -> Result<Report, AnalyzerError> {
    let mut parsed = parser::parse_reader(reader)?;
    event::flags::derive_all(&mut parsed.events, thresholds);
    let analysis = analysis::analyze(&parsed.events, &parsed.heap, thresholds);
    Ok(Report {
        events: parsed.events,
        analysis,
        heap: parsed.heap,
        stats: parsed.stats,
    })
}

pub fn analyze_str(text: &str, thresholds: &Thresholds) -> Result<Report, AnalyzerError> {
    analyze_reader(text.as_bytes(), thresholds)
}
