//! Run: analyse one log file and report.

use std::io::Write;

use tracing::{info, warn};

use crate::analysis::Severity;
use crate::conf::Thresholds;
use crate::parser::units::format_size;
use crate::{parse_file, Report};

/// Analyse `path`; with `json`, write the full report to stdout.
pub fn run(path: &str, json: bool, thresholds: &Thresholds) -> Result<Report, Box<dyn std::error::Error>> {
    let report = parse_file(path, thresholds)?;
    summarize(&report);

    if json {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    }
    Ok(report)
}

fn summarize(report: &Report) {
    let metrics = &report.analysis.metrics;
    let trend = &report.analysis.trend;

    if let Some(max) = report.heap.heap_max {
        info!(
            "Heap: max {}, region size {}",
            format_size(max),
            report.heap.region_size.map(format_size).unwrap_or_else(|| "unknown".to_string())
        );
    }
    let throughput = metrics
        .throughput_percent
        .map(|t| format!("{:.2}%", t))
        .unwrap_or_else(|| "unknown".to_string());
    info!(
        "{} events over {:.1}s: throughput {}, pauses p50 {:.1}ms p95 {:.1}ms p99 {:.1}ms max {:.1}ms",
        metrics.total_events,
        metrics.elapsed_secs,
        throughput,
        metrics.pauses.p50_ms,
        metrics.pauses.p95_ms,
        metrics.pauses.p99_ms,
        metrics.pauses.max_ms
    );
    if trend.evaluated {
        info!(
            "Heap trend: {:.1} MB/h (R² {:.3}), leak severity {:?}",
            trend.growth_mb_per_hour, trend.confidence, trend.severity
        );
    }

    let flagged = report.events.iter().filter(|e| e.flags.any()).count();
    if flagged > 0 {
        info!("{} of {} events carry diagnostic flags", flagged, metrics.total_events);
    }

    let flags = &report.analysis.flags;
    match report.analysis.severity {
        Severity::Critical => warn!("Critical: {:?}", flags.critical),
        Severity::Warning => warn!("Warnings: {:?}", flags.warning),
        Severity::Info => info!("Notes: {:?}", flags.info),
        Severity::Ok => info!("No issues found"),
    }
}
