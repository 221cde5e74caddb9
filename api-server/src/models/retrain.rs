//! Retrain DTOs

use drugclf_core::{EvaluationResult, Hyperparameters, PipelineConfig};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// New hyperparameters; every field may be omitted.
///
/// `test_size` is left to the training pipeline, which rejects anything
/// outside (0, 1).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetrainRequest {
    #[validate(range(min = 1, max = 1000))]
    pub n_estimators: usize,

    #[validate(range(min = 2, max = 1000))]
    pub max_leaf_nodes: usize,

    pub test_size: f64,

    pub apply_smote: bool,
}

impl Default for RetrainRequest {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_leaf_nodes: 30,
            test_size: 0.3,
            apply_smote: false,
        }
    }
}

impl RetrainRequest {
    /// Merge with the process-wide seed and unknown-category policy
    pub fn to_hyperparameters(&self, pipeline: &PipelineConfig) -> Hyperparameters {
        Hyperparameters {
            tree_count: self.n_estimators,
            max_leaf_nodes: self.max_leaf_nodes,
            held_out_fraction: self.test_size,
            apply_rebalancing: self.apply_smote,
            random_state: pipeline.random_state,
            unknown_category: pipeline.unknown_category,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub status: &'static str,
    pub accuracy: f64,
    pub evaluation: EvaluationResult,
    pub parameters: RetrainRequest,
    pub model_path: String,
    pub run_id: String,
}
