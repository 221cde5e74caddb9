//! SMOTE - synthetic minority oversampling
//!
//! Every label below the majority count is topped up with synthetic rows
//! interpolated between a sample and one of its `k` nearest same-label
//! neighbours. Original rows come first in the output, synthetic rows are
//! appended. Only ever applied to the training partition.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CoreError, CoreResult};

/// Default neighbour count
pub const DEFAULT_K_NEIGHBORS: usize = 5;

#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(seed: u64) -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            seed,
        }
    }

    /// Oversample `x`/`y` until every label matches the majority count.
    ///
    /// `y` holds label indices in `0..n_labels`.
    pub fn fit_resample(
        &self,
        x: &Array2<f32>,
        y: &[usize],
        n_labels: usize,
    ) -> CoreResult<(Array2<f32>, Vec<usize>)> {
        if x.nrows() != y.len() {
            return Err(CoreError::Training(format!(
                "rebalancing needs one label per row ({} rows, {} labels)",
                x.nrows(),
                y.len()
            )));
        }

        let mut by_label: Vec<Vec<usize>> = vec![Vec::new(); n_labels];
        for (row, &label) in y.iter().enumerate() {
            by_label
                .get_mut(label)
                .ok_or_else(|| CoreError::Training(format!("label index {} out of range", label)))?
                .push(row);
        }

        let majority = by_label.iter().map(Vec::len).max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out_x = x.clone();
        let mut out_y = y.to_vec();

        for (label, members) in by_label.iter().enumerate() {
            let deficit = majority - members.len();
            if members.is_empty() || deficit == 0 {
                continue;
            }

            let synthetic = self.synthesize(x, members, deficit, &mut rng);
            out_x.append(Axis(0), synthetic.view()).map_err(|e| {
                CoreError::Training(format!("rebalancing shape error: {}", e))
            })?;
            out_y.extend(std::iter::repeat(label).take(deficit));

            log::debug!(
                "SMOTE: label {} {} → {} rows",
                label,
                members.len(),
                majority
            );
        }

        Ok((out_x, out_y))
    }

    fn synthesize(
        &self,
        x: &Array2<f32>,
        members: &[usize],
        count: usize,
        rng: &mut StdRng,
    ) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((count, x.ncols()));

        // A lone sample has no neighbours: duplicate it
        if members.len() == 1 {
            for mut row in out.rows_mut() {
                row.assign(&x.row(members[0]));
            }
            return out;
        }

        let k = self.k_neighbors.min(members.len() - 1);
        let neighbours: Vec<Vec<usize>> = members
            .iter()
            .map(|&m| nearest(x, m, members, k))
            .collect();

        for mut row in out.rows_mut() {
            let pick = rng.gen_range(0..members.len());
            let base = x.row(members[pick]);
            let other = x.row(neighbours[pick][rng.gen_range(0..k)]);
            let gap: f32 = rng.gen();

            let sample: Array1<f32> = &base + &((&other - &base) * gap);
            row.assign(&sample);
        }

        out
    }
}

/// Indices (into `x`) of the `k` closest rows to `target` among `members`
fn nearest(x: &Array2<f32>, target: usize, members: &[usize], k: usize) -> Vec<usize> {
    let origin = x.row(target);
    let mut candidates: Vec<(f32, usize)> = members
        .iter()
        .filter(|&&m| m != target)
        .map(|&m| (squared_distance(origin, x.row(m)), m))
        .collect();

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates.into_iter().take(k).map(|(_, m)| m).collect()
}

fn squared_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum()
}
