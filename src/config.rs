use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::DEFAULT_DATA_DIR;
use crate::error::{DashboardError, Result};
use crate::pipeline::processing::quality_gate::QualityGateConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "prospect.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub cache: CacheConfig,
    pub quality_gates: QualityGateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Data root used when the environment variable is unset
    pub default_root: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_root: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `prospect.toml` from the working directory, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let gates = &self.quality_gates;
        let fractions = [
            ("critical_completeness_min", gates.critical_completeness_min),
            ("max_unmatched_rate", gates.max_unmatched_rate),
            ("min_coordinate_coverage", gates.min_coordinate_coverage),
            ("min_research_coverage", gates.min_research_coverage),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(DashboardError::Config(format!(
                    "quality_gates.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if gates.weight_sum_tolerance < 0.0 {
            return Err(DashboardError::Config(format!(
                "quality_gates.weight_sum_tolerance must be non-negative, got {}",
                gates.weight_sum_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.data.default_root, PathBuf::from("./data"));
        assert_eq!(config.quality_gates.critical_completeness_min, 0.99);
        assert_eq!(config.quality_gates.max_unmatched_rate, 0.10);
    }

    #[test]
    fn test_partial_sections_override_only_given_keys() {
        let config = Config::from_toml_str(
            r#"
            [cache]
            ttl_seconds = 30

            [quality_gates]
            min_research_coverage = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl_seconds, 30);
        assert_eq!(config.quality_gates.min_research_coverage, 0.5);
        assert_eq!(config.quality_gates.min_coordinate_coverage, 0.80);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let err = Config::from_toml_str("[quality_gates]\nmax_unmatched_rate = 1.5\n").unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = Config::load_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
