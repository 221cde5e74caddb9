//! Training pipeline
//!
//! split → derive schema (training partition only) → encode → optional SMOTE
//! (training partition only) → fit forest → score on the held-out partition.

use std::collections::BTreeSet;

use chrono::Utc;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::forest::{RandomForest, DEFAULT_FOREST_SEED, DEFAULT_MAX_LEAF_NODES, DEFAULT_TREE_COUNT};
use super::metrics::EvaluationResult;
use super::TrainedModel;
use crate::error::{CoreError, CoreResult};
use crate::logic::dataset::split::{train_test_split, validate_fraction, DEFAULT_HELD_OUT_FRACTION};
use crate::logic::dataset::{LabeledRecord, Smote, SplitIndices};
use crate::logic::features::{FeatureSchema, PatientRecord, UnknownCategoryPolicy};

// ============================================================================
// HYPERPARAMETERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub tree_count: usize,
    pub max_leaf_nodes: usize,
    pub held_out_fraction: f64,
    /// SMOTE over the training partition
    pub apply_rebalancing: bool,
    /// Seed for the split and for rebalancing
    pub random_state: u64,
    /// Seed of the forest (tree `i` uses `forest_seed + i`)
    pub forest_seed: u64,
    pub unknown_category: UnknownCategoryPolicy,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            max_leaf_nodes: DEFAULT_MAX_LEAF_NODES,
            held_out_fraction: DEFAULT_HELD_OUT_FRACTION,
            apply_rebalancing: true,
            random_state: 0,
            forest_seed: DEFAULT_FOREST_SEED,
            unknown_category: UnknownCategoryPolicy::Reject,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> CoreResult<()> {
        validate_fraction(self.held_out_fraction)?;
        if self.tree_count == 0 {
            return Err(CoreError::Training("tree count must be at least 1".into()));
        }
        if self.max_leaf_nodes < 2 {
            return Err(CoreError::Training(format!(
                "max leaf nodes must be at least 2, got {}",
                self.max_leaf_nodes
            )));
        }
        Ok(())
    }
}

// ============================================================================
// DATA PREPARATION
// ============================================================================

/// Encoded partitions ready for fitting and scoring
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub split: SplitIndices,
    pub schema: FeatureSchema,
    /// Sorted distinct labels; class index `i` is `labels[i]`
    pub labels: Vec<String>,
    pub x_train: Array2<f32>,
    pub y_train: Vec<usize>,
    pub x_held_out: Array2<f32>,
    pub y_held_out: Vec<usize>,
    /// Rows appended to the training partition by rebalancing
    pub synthetic_rows: usize,
}

/// Sorted distinct labels; fewer than two is a training error
pub fn label_set(labels: &[String]) -> CoreResult<Vec<String>> {
    let distinct: BTreeSet<&String> = labels.iter().collect();
    if distinct.len() < 2 {
        return Err(CoreError::Training(format!(
            "need at least two distinct labels, found {}",
            distinct.len()
        )));
    }
    Ok(distinct.into_iter().cloned().collect())
}

fn label_indices(labels: &[String], set: &[String]) -> CoreResult<Vec<usize>> {
    labels
        .iter()
        .map(|l| {
            set.binary_search(l)
                .map_err(|_| CoreError::Training(format!("label {:?} not in label set", l)))
        })
        .collect()
}

/// Split, derive the schema and encode both partitions
pub fn prepare(
    records: &[PatientRecord],
    labels: &[String],
    params: &Hyperparameters,
) -> CoreResult<PreparedData> {
    if records.is_empty() {
        return Err(CoreError::Schema("training table is empty".into()));
    }
    if records.len() != labels.len() {
        return Err(CoreError::Training(format!(
            "{} records but {} labels",
            records.len(),
            labels.len()
        )));
    }
    params.validate()?;

    let label_set = label_set(labels)?;
    let y = label_indices(labels, &label_set)?;

    let split = train_test_split(records.len(), params.held_out_fraction, params.random_state)?;
    let (train_records, held_out_records) = split.apply(records);
    let (y_train, y_held_out) = split.apply(&y);

    let schema = FeatureSchema::derive(&train_records, params.unknown_category)?;
    let x_train = schema.encode_matrix(&train_records)?;
    // Held-out categories missing from the training partition encode as zero rows
    let unseen = schema.count_unseen(&held_out_records);
    if unseen > 0 {
        log::warn!(
            "{} held-out rows carry categories absent from the training partition",
            unseen
        );
    }
    let x_held_out = schema.encode_matrix_aligned(&held_out_records)?;

    let train_rows = x_train.nrows();
    let (x_train, y_train) = if params.apply_rebalancing {
        Smote::new(params.random_state).fit_resample(&x_train, &y_train, label_set.len())?
    } else {
        (x_train, y_train)
    };
    let synthetic_rows = x_train.nrows() - train_rows;

    log::info!(
        "Prepared data: {} train rows (+{} synthetic), {} held-out rows, {} columns, {} labels",
        train_rows,
        synthetic_rows,
        x_held_out.nrows(),
        schema.len(),
        label_set.len()
    );

    Ok(PreparedData {
        split,
        schema,
        labels: label_set,
        x_train,
        y_train,
        x_held_out,
        y_held_out,
        synthetic_rows,
    })
}

// ============================================================================
// TRAINING
// ============================================================================

/// Fit a forest and score it on the held-out partition
pub fn train(
    records: &[PatientRecord],
    labels: &[String],
    params: &Hyperparameters,
) -> CoreResult<(TrainedModel, EvaluationResult)> {
    let data = prepare(records, labels, params)?;

    let mut forest = RandomForest::new(params.tree_count, params.max_leaf_nodes, params.forest_seed);
    forest.fit(data.x_train.view(), &data.y_train, data.labels.len())?;

    let predicted = forest.predict(&data.x_held_out)?;
    let evaluation = EvaluationResult::compute(&data.y_held_out, &predicted, &data.labels);

    log::info!(
        "Trained forest ({} trees, max {} leaves): held-out accuracy {:.4}",
        params.tree_count,
        params.max_leaf_nodes,
        evaluation.accuracy
    );

    let model = TrainedModel {
        run_id: Uuid::new_v4(),
        trained_at: Utc::now(),
        hyperparameters: params.clone(),
        schema: data.schema,
        labels: data.labels,
        forest,
        training_rows: data.split.train.len(),
        evaluation: evaluation.clone(),
    };

    Ok((model, evaluation))
}

/// [`train`] over labelled rows
pub fn train_labeled(
    rows: &[LabeledRecord],
    params: &Hyperparameters,
) -> CoreResult<(TrainedModel, EvaluationResult)> {
    let (records, labels) = crate::logic::dataset::unzip(rows);
    train(&records, &labels, params)
}

/// Score a stored model against the held-out partition it was evaluated on.
///
/// Replays the split with the model's own seed and fraction.
pub fn evaluate_on_dataset(
    model: &TrainedModel,
    rows: &[LabeledRecord],
) -> CoreResult<EvaluationResult> {
    let params = &model.hyperparameters;
    let split = train_test_split(rows.len(), params.held_out_fraction, params.random_state)?;
    let (_, held_out) = split.apply(rows);

    let mut actual = Vec::with_capacity(held_out.len());
    let mut predicted = Vec::with_capacity(held_out.len());
    for row in &held_out {
        let class = model.labels.binary_search(&row.label).map_err(|_| {
            CoreError::Training(format!("label {:?} unknown to the model", row.label))
        })?;
        actual.push(class);
        let vector = model.schema.encode_aligned(&row.record)?;
        predicted.push(model.predict_vector(&vector)?);
    }

    Ok(EvaluationResult::compute(&actual, &predicted, &model.labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::synthetic::generate;
    use crate::logic::dataset::unzip;
    use std::collections::HashSet;

    fn dataset() -> (Vec<PatientRecord>, Vec<String>) {
        unzip(&generate(200, 42))
    }

    #[test]
    fn test_train_reference_configuration() {
        let (records, labels) = dataset();
        let params = Hyperparameters {
            tree_count: 100,
            max_leaf_nodes: 30,
            held_out_fraction: 0.3,
            ..Default::default()
        };

        let (model, eval) = train(&records, &labels, &params).unwrap();
        assert!((0.0..=1.0).contains(&eval.accuracy));
        assert_eq!(eval.held_out_rows, 60);
        assert_eq!(model.training_rows, 140);
        assert_eq!(model.labels.len(), 5);

        // Confusion row sums equal the held-out label counts
        let split = train_test_split(200, 0.3, 0).unwrap();
        let mut expected = vec![0usize; model.labels.len()];
        for &i in &split.held_out {
            expected[model.labels.binary_search(&labels[i]).unwrap()] += 1;
        }
        assert_eq!(eval.row_sums(), expected);

        // The synthetic rule is learnable
        assert!(eval.accuracy >= 0.7, "accuracy {}", eval.accuracy);
    }

    #[test]
    fn test_held_out_disjoint_from_training() {
        let (records, labels) = dataset();
        let data = prepare(&records, &labels, &Hyperparameters::default()).unwrap();

        let train: HashSet<_> = data.split.train.iter().collect();
        assert!(data.split.held_out.iter().all(|i| !train.contains(i)));

        // Rebalanced rows are appended after the original training rows only
        assert_eq!(data.x_train.nrows(), data.split.train.len() + data.synthetic_rows);
        assert_eq!(data.x_held_out.nrows(), data.split.held_out.len());
        assert!(data.synthetic_rows > 0);
    }

    #[test]
    fn test_rebalancing_equalizes_training_labels() {
        let (records, labels) = dataset();
        let data = prepare(&records, &labels, &Hyperparameters::default()).unwrap();

        let mut counts = vec![0usize; data.labels.len()];
        for &y in &data.y_train {
            counts[y] += 1;
        }
        let max = counts.iter().copied().max().unwrap();
        assert!(counts.iter().all(|&c| c == max || c == 0), "{:?}", counts);
    }

    #[test]
    fn test_training_errors() {
        let (records, labels) = dataset();

        let one_label = vec!["drugX".to_string(); records.len()];
        assert!(matches!(
            train(&records, &one_label, &Hyperparameters::default()),
            Err(CoreError::Training(_))
        ));

        for params in [
            Hyperparameters { held_out_fraction: 1.5, ..Default::default() },
            Hyperparameters { held_out_fraction: 0.0, ..Default::default() },
            Hyperparameters { tree_count: 0, ..Default::default() },
            Hyperparameters { max_leaf_nodes: 1, ..Default::default() },
        ] {
            assert!(
                matches!(train(&records, &labels, &params), Err(CoreError::Training(_))),
                "{:?} accepted",
                params
            );
        }

        assert!(matches!(
            train(&[], &[], &Hyperparameters::default()),
            Err(CoreError::Schema(_))
        ));
    }

    #[test]
    fn test_training_is_deterministic() {
        let (records, labels) = dataset();
        let params = Hyperparameters { tree_count: 20, ..Default::default() };
        let (a, _) = train(&records, &labels, &params).unwrap();
        let (b, _) = train(&records, &labels, &params).unwrap();
        assert_eq!(a.forest, b.forest);
        assert_eq!(a.schema, b.schema);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_evaluate_on_dataset_replays_split() {
        let rows = generate(200, 42);
        let params = Hyperparameters { tree_count: 20, ..Default::default() };
        let (model, eval) = train_labeled(&rows, &params).unwrap();

        let replayed = evaluate_on_dataset(&model, &rows).unwrap();
        assert_eq!(replayed, eval);
    }

    #[test]
    fn test_held_out_category_missing_from_training_partition() {
        use crate::logic::features::BloodPressure;

        let (records, labels) = dataset();
        let split = train_test_split(records.len(), 0.3, 0).unwrap();
        let lone = split.held_out[0];
        let records: Vec<PatientRecord> = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let bp = if i == lone { BloodPressure::Low } else { BloodPressure::High };
                PatientRecord::new(r.age(), r.sex(), bp, r.cholesterol(), r.na_to_k()).unwrap()
            })
            .collect();

        let params = Hyperparameters { tree_count: 20, ..Default::default() };
        let (model, eval) = train(&records, &labels, &params).unwrap();
        assert_eq!(eval.held_out_rows, 60);
        assert!(!model.schema.columns().iter().any(|c| c == "BP_LOW"));

        // The stored schema still rejects the category at inference
        assert!(matches!(model.predict(&records[lone]), Err(CoreError::Encoding(_))));

        let rows: Vec<LabeledRecord> = records
            .into_iter()
            .zip(labels)
            .map(|(record, label)| LabeledRecord { record, label })
            .collect();
        assert_eq!(evaluate_on_dataset(&model, &rows).unwrap(), eval);
    }
}
