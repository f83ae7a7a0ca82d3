//! Boot: config load, logging init, threshold resolution.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::{AnalyzerConfig, Profile, Thresholds};
use crate::error::AnalyzerError;

/// Initialise the tracing / logging subsystem.
///
/// `RUST_LOG` wins over `default_filter`. Output goes to stderr so stdout
/// stays clean for the JSON report.
pub fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration (explicit file, or `ANALYZER_CONFIG_FILE` / defaults),
/// start logging with its filter, and resolve the thresholds.
pub fn boot(config_path: Option<&str>, profile: Option<Profile>) -> Result<(AnalyzerConfig, Thresholds), AnalyzerError> {
    let mut config = match config_path {
        Some(path) => AnalyzerConfig::load_from(path)?,
        None => AnalyzerConfig::load()?,
    };
    if let Some(profile) = profile {
        config.profile = profile;
    }

    init_logging(&config.log_filter);

    let thresholds = config.thresholds()?;
    info!(
        "Profile: {} (pause target {}ms, slow phase {}ms)",
        config.profile.as_str(),
        thresholds.pause_target_ms,
        thresholds.slow_phase_ms
    );
    Ok((config, thresholds))
}
