//! Model Module - random forest classifier
//!
//! Training, hard-vote inference and the on-disk bundle. A [`TrainedModel`]
//! always travels with the [`FeatureSchema`] it was fit against.

pub mod forest;
pub mod metrics;
pub mod storage;
pub mod trainer;
pub mod tree;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::logic::features::{FeatureSchema, FeatureVector, PatientRecord};

// Re-export common types
pub use forest::RandomForest;
pub use metrics::{EvaluationResult, LabelReport};
pub use storage::{load, persist, BUNDLE_FORMAT_VERSION};
pub use trainer::{evaluate_on_dataset, train, train_labeled, Hyperparameters};

/// Fitted forest plus everything needed to replay its feature layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub hyperparameters: Hyperparameters,
    pub schema: FeatureSchema,
    /// Class index `i` predicts `labels[i]`
    pub labels: Vec<String>,
    pub forest: RandomForest,
    /// Rows in the training partition before rebalancing
    pub training_rows: usize,
    pub evaluation: EvaluationResult,
}

impl TrainedModel {
    /// Encode against the model's own schema
    pub fn encode(&self, record: &PatientRecord) -> CoreResult<FeatureVector> {
        self.schema.encode_one(record)
    }

    pub fn predict_index(&self, record: &PatientRecord) -> CoreResult<usize> {
        let vector = self.encode(record)?;
        log::debug!("Encoded features {}", vector.to_log_entry(&self.schema));
        self.predict_vector(&vector)
    }

    /// Predict from an already encoded vector; it must carry this schema's hash
    pub fn predict_vector(&self, vector: &FeatureVector) -> CoreResult<usize> {
        vector.validate(&self.schema)?;
        self.forest.predict_row(vector.as_slice())
    }

    /// Predicted label for one validated patient
    pub fn predict(&self, record: &PatientRecord) -> CoreResult<String> {
        let index = self.predict_index(record)?;
        self.labels
            .get(index)
            .cloned()
            .ok_or_else(|| CoreError::Encoding(format!("class index {} has no label", index)))
    }

    /// Consistency between forest, schema and label set
    pub fn validate(&self) -> CoreResult<()> {
        self.schema
            .validate()
            .map_err(|e| CoreError::Persistence(format!("stored schema rejected: {}", e)))?;
        self.forest.validate()?;

        if self.forest.n_features() != self.schema.len() {
            return Err(CoreError::Persistence(format!(
                "forest expects {} features but schema has {} columns",
                self.forest.n_features(),
                self.schema.len()
            )));
        }
        if self.forest.n_classes() != self.labels.len() {
            return Err(CoreError::Persistence(format!(
                "forest has {} classes but {} labels are stored",
                self.forest.n_classes(),
                self.labels.len()
            )));
        }
        Ok(())
    }
}
