//! CART decision tree (Gini impurity) grown best-first.
//!
//! Growth always expands the leaf whose best split yields the largest
//! weighted impurity decrease, until `max_leaf_nodes` leaves exist or no leaf
//! can be split further. Nodes live in a flat arena; index 0 is the root.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Smallest impurity decrease worth a split
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
        samples: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_leaf_nodes: usize,
    /// Candidate features examined per split
    pub max_features: usize,
    pub n_classes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

/// A leaf waiting to be expanded
struct Candidate {
    /// Weighted impurity decrease
    gain: f64,
    node: usize,
    feature: usize,
    threshold: f32,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Max-heap on gain; earlier nodes win ties
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl DecisionTree {
    /// Fit on the rows of `x` listed in `samples` (duplicates allowed)
    pub fn fit(
        x: ArrayView2<f32>,
        y: &[usize],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self {
            nodes: vec![leaf(y, &samples, params.n_classes)],
            n_features: x.ncols(),
        };

        let mut frontier = BinaryHeap::new();
        if let Some(c) = best_split(x, y, 0, samples, params, rng) {
            frontier.push(c);
        }

        let mut leaves = 1;
        while leaves < params.max_leaf_nodes.max(1) {
            let Some(c) = frontier.pop() else { break };

            let left_id = tree.nodes.len();
            let right_id = left_id + 1;
            tree.nodes.push(leaf(y, &c.left, params.n_classes));
            tree.nodes.push(leaf(y, &c.right, params.n_classes));
            tree.nodes[c.node] = Node::Split {
                feature: c.feature,
                threshold: c.threshold,
                left: left_id,
                right: right_id,
            };
            leaves += 1;

            if let Some(next) = best_split(x, y, left_id, c.left, params, rng) {
                frontier.push(next);
            }
            if let Some(next) = best_split(x, y, right_id, c.right, params, rng) {
                frontier.push(next);
            }
        }

        tree
    }

    /// Predicted class index for one feature row
    pub fn predict_row(&self, row: &[f32]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class, .. } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Check that child links and feature indices stay inside the tree
    pub fn is_well_formed(&self, n_classes: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Leaf { class, .. } => *class < n_classes,
                Node::Split {
                    feature,
                    left,
                    right,
                    threshold,
                } => {
                    *feature < self.n_features
                        && threshold.is_finite()
                        && *left > i
                        && *right > i
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &s in samples {
        counts[y[s]] += 1;
    }
    counts
}

/// Majority class; ties go to the lowest class index
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn leaf(y: &[usize], samples: &[usize], n_classes: usize) -> Node {
    Node::Leaf {
        class: majority(&class_counts(y, samples, n_classes)),
        samples: samples.len(),
    }
}

/// Gini = 1 - Σ(p_i²)
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Best split of a node's samples over a random subset of features.
///
/// Features are visited in random order; the search keeps going past
/// `max_features` until at least one valid split has been found.
fn best_split(
    x: ArrayView2<f32>,
    y: &[usize],
    node: usize,
    samples: Vec<usize>,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<Candidate> {
    let n = samples.len();
    if n < 2 {
        return None;
    }

    let counts = class_counts(y, &samples, params.n_classes);
    let parent = gini(&counts, n);
    if parent <= 0.0 {
        return None;
    }

    let mut features: Vec<usize> = (0..x.ncols()).collect();
    features.shuffle(rng);

    // (gain, feature, threshold)
    let mut best: Option<(f64, usize, f32)> = None;
    let mut sorted = samples.clone();

    for (visited, &feature) in features.iter().enumerate() {
        if visited >= params.max_features && best.is_some() {
            break;
        }

        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_counts = vec![0usize; params.n_classes];
        let mut right_counts = counts.clone();

        for i in 0..n - 1 {
            let class = y[sorted[i]];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let here = x[[sorted[i], feature]];
            let next = x[[sorted[i + 1], feature]];
            if here == next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            let weighted = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / n as f64;
            let gain = n as f64 * (parent - weighted);

            if gain > MIN_GAIN && best.map_or(true, |(g, _, _)| gain > g) {
                let mut threshold = here + (next - here) / 2.0;
                // Midpoint can round up onto `next`
                if threshold >= next {
                    threshold = here;
                }
                best = Some((gain, feature, threshold));
            }
        }
    }

    let (gain, feature, threshold) = best?;
    let (left, right): (Vec<usize>, Vec<usize>) =
        samples.into_iter().partition(|&s| x[[s, feature]] <= threshold);

    Some(Candidate {
        gain,
        node,
        feature,
        threshold,
        left,
        right,
    })
}
