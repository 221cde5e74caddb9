//! Seeded train / held-out split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Default fraction of rows kept out of fitting
pub const DEFAULT_HELD_OUT_FRACTION: f64 = 0.3;

/// Row indices of the two partitions. Disjoint, together covering `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub held_out: Vec<usize>,
}

impl SplitIndices {
    /// Pick the rows of `items` belonging to each partition
    pub fn apply<T: Clone>(&self, items: &[T]) -> (Vec<T>, Vec<T>) {
        let pick = |idx: &[usize]| -> Vec<T> { idx.iter().map(|&i| items[i].clone()).collect() };
        (pick(&self.train), pick(&self.held_out))
    }
}

/// Check that a held-out fraction lies strictly inside (0, 1)
pub fn validate_fraction(held_out_fraction: f64) -> CoreResult<()> {
    if !(held_out_fraction > 0.0 && held_out_fraction < 1.0) {
        return Err(CoreError::Training(format!(
            "held-out fraction must be in (0, 1), got {}",
            held_out_fraction
        )));
    }
    Ok(())
}

/// Shuffle `0..n_samples` with a fixed seed and cut off the held-out tail.
///
/// The held-out partition gets `ceil(n * fraction)` rows.
pub fn train_test_split(
    n_samples: usize,
    held_out_fraction: f64,
    seed: u64,
) -> CoreResult<SplitIndices> {
    validate_fraction(held_out_fraction)?;

    let n_held_out = (n_samples as f64 * held_out_fraction).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_held_out);
    if n_held_out == 0 || n_train == 0 {
        return Err(CoreError::Training(format!(
            "cannot split {} rows with held-out fraction {}: a partition would be empty",
            n_samples, held_out_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let held_out = indices.split_off(n_train);
    Ok(SplitIndices {
        train: indices,
        held_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(200, 0.3, 0).unwrap();
        assert_eq!(split.held_out.len(), 60);
        assert_eq!(split.train.len(), 140);

        // ceil: 10 * 0.25 = 2.5 → 3
        let split = train_test_split(10, 0.25, 0).unwrap();
        assert_eq!(split.held_out.len(), 3);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let split = train_test_split(57, 0.3, 7).unwrap();
        let train: HashSet<_> = split.train.iter().copied().collect();
        let held: HashSet<_> = split.held_out.iter().copied().collect();
        assert!(train.is_disjoint(&held));
        assert_eq!(train.len() + held.len(), 57);
        assert!((0..57).all(|i| train.contains(&i) || held.contains(&i)));
    }

    #[test]
    fn test_split_is_reproducible() {
        assert_eq!(train_test_split(100, 0.3, 42).unwrap(), train_test_split(100, 0.3, 42).unwrap());
        assert_ne!(train_test_split(100, 0.3, 42).unwrap(), train_test_split(100, 0.3, 43).unwrap());
    }

    #[test]
    fn test_invalid_fraction() {
        for bad in [0.0, 1.0, 1.5, -0.2, f64::NAN] {
            let err = train_test_split(100, bad, 0).unwrap_err();
            assert!(matches!(err, CoreError::Training(_)), "fraction {} accepted", bad);
        }
    }

    #[test]
    fn test_empty_partition_rejected() {
        assert!(matches!(train_test_split(1, 0.3, 0), Err(CoreError::Training(_))));
        assert!(matches!(train_test_split(0, 0.3, 0), Err(CoreError::Training(_))));
    }

    #[test]
    fn test_apply_picks_rows() {
        let items: Vec<u32> = (100..110).collect();
        let split = train_test_split(items.len(), 0.2, 3).unwrap();
        let (train, held) = split.apply(&items);
        assert_eq!(train.len(), 8);
        assert_eq!(held.len(), 2);
        for (i, &idx) in split.held_out.iter().enumerate() {
            assert_eq!(held[i], items[idx]);
        }
    }
}
