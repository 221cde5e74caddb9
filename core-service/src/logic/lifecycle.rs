//! Model Lifecycle - the active model slot
//!
//! Readers take an `Arc` snapshot under a short read lock and predict without
//! holding any lock. Retraining builds and persists the new model outside the
//! slot, then swaps it in under the write lock. A failed retrain leaves the
//! slot untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::logic::dataset::LabeledRecord;
use crate::logic::features::RawPatient;
use crate::logic::model::{self, EvaluationResult, Hyperparameters, TrainedModel};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model description for `/model/info`
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub n_estimators: usize,
    pub max_leaf_nodes: usize,
    pub n_features: usize,
    pub classes: Vec<String>,
    pub feature_columns: Vec<String>,
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub accuracy: f64,
}

impl From<&TrainedModel> for ModelInfo {
    fn from(m: &TrainedModel) -> Self {
        Self {
            model_type: "RandomForestClassifier".to_string(),
            n_estimators: m.forest.tree_count(),
            max_leaf_nodes: m.forest.max_leaf_nodes(),
            n_features: m.schema.len(),
            classes: m.labels.clone(),
            feature_columns: m.schema.columns().to_vec(),
            run_id: m.run_id,
            trained_at: m.trained_at,
            training_rows: m.training_rows,
            accuracy: m.evaluation.accuracy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub model_loaded: bool,
    pub model_path: PathBuf,
    pub run_id: Option<Uuid>,
    pub dataset_rows: usize,
}

// ============================================================================
// LIFECYCLE
// ============================================================================

pub struct ModelLifecycle {
    /// Dataset every retrain starts from
    dataset: Vec<LabeledRecord>,
    model_path: PathBuf,
    active: RwLock<Option<Arc<TrainedModel>>>,
    /// Serializes retrains so persist order matches swap order
    retrain_lock: Mutex<()>,
}

impl ModelLifecycle {
    /// Unloaded lifecycle over `dataset`, persisting to `model_path`
    pub fn new(dataset: Vec<LabeledRecord>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset,
            model_path: model_path.into(),
            active: RwLock::new(None),
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Load the persisted bundle into the active slot
    pub fn load(&self) -> CoreResult<Arc<TrainedModel>> {
        let loaded = Arc::new(model::load(&self.model_path)?);
        self.install(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Train on the stored dataset, persist, then swap.
    ///
    /// Concurrent calls run one after another.
    pub fn retrain(&self, params: &Hyperparameters) -> CoreResult<(Arc<TrainedModel>, EvaluationResult)> {
        let _guard = self.retrain_lock.lock();

        log::info!(
            "Retraining on {} rows: {} trees, max {} leaves, held-out {}, rebalancing {}",
            self.dataset.len(),
            params.tree_count,
            params.max_leaf_nodes,
            params.held_out_fraction,
            params.apply_rebalancing
        );

        let (trained, evaluation) = model::train_labeled(&self.dataset, params).map_err(|e| {
            log::warn!("Retrain rejected: {}", e);
            e
        })?;
        model::persist(&trained, &self.model_path)?;

        let trained = Arc::new(trained);
        self.install(Arc::clone(&trained));
        Ok((trained, evaluation))
    }

    /// Replace the active model
    pub fn install(&self, trained: Arc<TrainedModel>) {
        let previous = self.active.write().replace(Arc::clone(&trained));
        match previous {
            Some(old) => log::info!("Active model {} → {}", old.run_id, trained.run_id),
            None => log::info!("Active model {}", trained.run_id),
        }
    }

    /// Current model, if any
    pub fn snapshot(&self) -> Option<Arc<TrainedModel>> {
        self.active.read().clone()
    }

    fn require_model(&self) -> CoreResult<Arc<TrainedModel>> {
        self.snapshot().ok_or(CoreError::ModelUnavailable)
    }

    /// Validate and classify one raw patient
    pub fn predict(&self, raw: &RawPatient) -> CoreResult<String> {
        let active = self.require_model()?;
        let record = raw.validate()?;
        active.predict(&record)
    }

    pub fn model_info(&self) -> CoreResult<ModelInfo> {
        Ok(ModelInfo::from(self.require_model()?.as_ref()))
    }

    pub fn health(&self) -> Health {
        let active = self.snapshot();
        Health {
            model_loaded: active.is_some(),
            model_path: self.model_path.clone(),
            run_id: active.map(|m| m.run_id),
            dataset_rows: self.dataset.len(),
        }
    }
}
