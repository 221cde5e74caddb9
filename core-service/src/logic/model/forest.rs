//! Random forest of best-first CART trees.
//!
//! Each tree sees a bootstrap sample of the training rows and its own
//! `StdRng` seeded with `random_state + tree_index`, so a forest is fully
//! determined by its data and seed.

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use crate::error::{CoreError, CoreResult};

pub const DEFAULT_TREE_COUNT: usize = 100;
pub const DEFAULT_MAX_LEAF_NODES: usize = 30;
pub const DEFAULT_FOREST_SEED: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    tree_count: usize,
    max_leaf_nodes: usize,
    random_state: u64,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Unfitted forest
    pub fn new(tree_count: usize, max_leaf_nodes: usize, random_state: u64) -> Self {
        Self {
            tree_count,
            max_leaf_nodes,
            random_state,
            n_features: 0,
            n_classes: 0,
            trees: Vec::new(),
        }
    }

    /// Fit on `x` with class indices `y` in `0..n_classes`
    pub fn fit(&mut self, x: ArrayView2<f32>, y: &[usize], n_classes: usize) -> CoreResult<()> {
        if self.tree_count == 0 {
            return Err(CoreError::Training("tree count must be at least 1".into()));
        }
        if self.max_leaf_nodes < 2 {
            return Err(CoreError::Training(format!(
                "max leaf nodes must be at least 2, got {}",
                self.max_leaf_nodes
            )));
        }
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(CoreError::Training(format!(
                "cannot fit on {} rows with {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(CoreError::Training(format!("class index {} out of range", bad)));
        }

        let n_features = x.ncols();
        let params = TreeParams {
            max_leaf_nodes: self.max_leaf_nodes,
            max_features: ((n_features as f64).sqrt().floor() as usize).max(1),
            n_classes,
        };

        let n_rows = x.nrows();
        self.trees = (0..self.tree_count)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.random_state.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(x, y, bootstrap, &params, &mut rng)
            })
            .collect();
        self.n_features = n_features;
        self.n_classes = n_classes;

        log::debug!(
            "Fitted forest: {} trees, {} features, {} classes, avg {:.1} leaves",
            self.trees.len(),
            n_features,
            n_classes,
            self.trees.iter().map(DecisionTree::n_leaves).sum::<usize>() as f64
                / self.trees.len() as f64
        );
        Ok(())
    }

    /// Hard vote across trees; ties go to the lowest class index
    pub fn predict_row(&self, row: &[f32]) -> CoreResult<usize> {
        if self.trees.is_empty() {
            return Err(CoreError::ModelUnavailable);
        }
        if row.len() != self.n_features {
            return Err(CoreError::Encoding(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict_row(row)] += 1;
        }

        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        Ok(best)
    }

    /// Predict every row of a matrix
    pub fn predict(&self, x: &Array2<f32>) -> CoreResult<Vec<usize>> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect()
    }

    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    pub fn max_leaf_nodes(&self) -> usize {
        self.max_leaf_nodes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Structural check used after deserializing a stored forest
    pub fn validate(&self) -> CoreResult<()> {
        if self.trees.len() != self.tree_count {
            return Err(CoreError::Persistence(format!(
                "forest declares {} trees but holds {}",
                self.tree_count,
                self.trees.len()
            )));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || !tree.is_well_formed(self.n_classes) {
                return Err(CoreError::Persistence(format!("tree {} is malformed", i)));
            }
        }
        Ok(())
    }
}
