//! Conf module: configuration model, threshold profiles, and loading.

pub mod model;
pub mod load;

pub use model::{AnalyzerConfig, ConfigError, Profile, Thresholds};
