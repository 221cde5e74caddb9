//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::logic::features::UnknownCategoryPolicy;

/// Default dataset location (drug200 layout)
pub const DEFAULT_DATA_PATH: &str = "drug200.csv";

/// Default model bundle location
pub const DEFAULT_MODEL_PATH: &str = "models/random_forest_model.json";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// CSV dataset used for training and retraining
    pub data_path: PathBuf,

    /// Where the model bundle is persisted and loaded from
    pub model_path: PathBuf,

    /// Seed for the held-out split and rebalancing
    pub random_state: u64,

    /// Policy frozen into every schema derived by this process
    pub unknown_category: UnknownCategoryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            random_state: 0,
            unknown_category: UnknownCategoryPolicy::Reject,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_path: env::var("DRUGCLF_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),

            model_path: env::var("DRUGCLF_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            random_state: env::var("DRUGCLF_RANDOM_STATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.random_state),

            unknown_category: env::var("DRUGCLF_UNKNOWN_CATEGORY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.unknown_category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_path, PathBuf::from("drug200.csv"));
        assert_eq!(config.model_path, PathBuf::from("models/random_forest_model.json"));
        assert_eq!(config.random_state, 0);
        assert_eq!(config.unknown_category, UnknownCategoryPolicy::Reject);
    }
}
