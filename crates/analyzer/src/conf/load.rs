//! Load: config loading from file and environment variables, and threshold resolution.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{AnalyzerConfig, ConfigError, Profile, Thresholds};

impl AnalyzerConfig {
    /// Load configuration from file or defaults.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("ANALYZER_CONFIG_FILE")
            .unwrap_or_else(|_| "analyzer.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load an explicitly named config file, then apply environment overrides.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        tracing::info!("Loading configuration from: {}", path);
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let mut file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Environment variables override file config
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(profile) = std::env::var("ANALYZER_PROFILE") {
            self.profile = Profile::parse(&profile)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown profile: {}", profile)))?;
        }
        if let Ok(target) = std::env::var("ANALYZER_PAUSE_TARGET_MS") {
            let value = target
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("ANALYZER_PAUSE_TARGET_MS is not a number: {}", target)))?;
            self.pause_target_ms = Some(value);
        }
        Ok(())
    }

    /// Resolve the effective thresholds: profile baseline, then the
    /// `[thresholds]` table, then `pause_target_ms`. Validated before return.
    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        let base = Thresholds::for_profile(self.profile);

        let mut merged = match toml::Value::try_from(base)? {
            toml::Value::Table(table) => table,
            _ => return Err(ConfigError::Invalid("thresholds did not serialize to a table".to_string())),
        };
        for (key, value) in &self.thresholds {
            if !merged.contains_key(key) {
                return Err(ConfigError::Invalid(format!("unknown threshold: {}", key)));
            }
            merged.insert(key.clone(), value.clone());
        }

        let mut thresholds: Thresholds = toml::Value::Table(merged).try_into()?;
        if let Some(target) = self.pause_target_ms {
            thresholds.pause_target_ms = target;
        }

        thresholds.validate()?;
        Ok(thresholds)
    }
}
