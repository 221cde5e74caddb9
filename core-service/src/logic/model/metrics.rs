//! Held-out evaluation: accuracy, confusion matrix, per-label report

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Held-out rows whose actual label is this one
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: f64,
    /// Support-weighted averages over labels
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub held_out_rows: usize,
    pub labels: Vec<String>,
    /// `confusion_matrix[actual][predicted]`
    pub confusion_matrix: Vec<Vec<usize>>,
    pub per_label: Vec<LabelReport>,
}

impl EvaluationResult {
    /// Score predicted class indices against actual ones
    pub fn compute(actual: &[usize], predicted: &[usize], labels: &[String]) -> Self {
        let n = labels.len();
        let mut confusion = vec![vec![0usize; n]; n];
        for (&a, &p) in actual.iter().zip(predicted) {
            confusion[a][p] += 1;
        }

        let total = actual.len();
        let correct: usize = (0..n).map(|i| confusion[i][i]).sum();

        let per_label: Vec<LabelReport> = (0..n)
            .map(|i| {
                let tp = confusion[i][i] as f64;
                let support: usize = confusion[i].iter().sum();
                let predicted_as: usize = confusion.iter().map(|row| row[i]).sum();

                let precision = ratio(tp, predicted_as as f64);
                let recall = ratio(tp, support as f64);
                let f1 = ratio(2.0 * precision * recall, precision + recall);
                LabelReport {
                    label: labels[i].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let weighted = |metric: fn(&LabelReport) -> f64| {
            ratio(
                per_label.iter().map(|r| metric(r) * r.support as f64).sum(),
                total as f64,
            )
        };

        let precision = weighted(|r| r.precision);
        let recall = weighted(|r| r.recall);
        let f1 = weighted(|r| r.f1);

        Self {
            accuracy: ratio(correct as f64, total as f64),
            precision,
            recall,
            f1,
            held_out_rows: total,
            labels: labels.to_vec(),
            confusion_matrix: confusion,
            per_label,
        }
    }

    /// Number of held-out rows per actual label
    pub fn row_sums(&self) -> Vec<usize> {
        self.confusion_matrix.iter().map(|row| row.iter().sum()).collect()
    }
}

/// Division that yields 0 for an empty denominator
fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4} ({} held-out rows)", self.accuracy, self.held_out_rows)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<10} {:>9} {:>9} {:>9} {:>9}",
            "label", "precision", "recall", "f1", "support"
        )?;
        for r in &self.per_label {
            writeln!(
                f,
                "{:<10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                r.label, r.precision, r.recall, r.f1, r.support
            )?;
        }
        writeln!(
            f,
            "{:<10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "weighted", self.precision, self.recall, self.f1, self.held_out_rows
        )?;

        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows = actual, columns = predicted):")?;
        write!(f, "{:<10}", "")?;
        for label in &self.labels {
            write!(f, " {:>7}", label)?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(&self.confusion_matrix) {
            write!(f, "{:<10}", label)?;
            for count in row {
                write!(f, " {:>7}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn test_perfect_predictions() {
        let y = vec![0, 1, 2, 2];
        let eval = EvaluationResult::compute(&y, &y, &labels());
        assert_eq!(eval.accuracy, 1.0);
        assert_eq!(eval.f1, 1.0);
        assert_eq!(eval.row_sums(), vec![1, 1, 2]);
    }

    #[test]
    fn test_confusion_and_weighted_scores() {
        let actual = vec![0, 0, 1, 1, 2, 2];
        let predicted = vec![0, 1, 1, 1, 2, 0];
        let eval = EvaluationResult::compute(&actual, &predicted, &labels());

        assert_eq!(eval.confusion_matrix, vec![vec![1, 1, 0], vec![0, 2, 0], vec![1, 0, 1]]);
        assert!((eval.accuracy - 4.0 / 6.0).abs() < 1e-12);

        // a: p=1/2 r=1/2, b: p=2/3 r=1, c: p=1 r=1/2
        assert!((eval.per_label[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(eval.per_label[2].recall, 0.5);
        // Weighted recall equals accuracy
        assert!((eval.recall - eval.accuracy).abs() < 1e-12);
        let expected_precision = (0.5 * 2.0 + 2.0 / 3.0 * 2.0 + 1.0 * 2.0) / 6.0;
        assert!((eval.precision - expected_precision).abs() < 1e-12);
    }

    #[test]
    fn test_never_predicted_label_scores_zero() {
        let eval = EvaluationResult::compute(&[0, 2], &[0, 0], &labels());
        assert_eq!(eval.per_label[2].precision, 0.0);
        assert_eq!(eval.per_label[2].f1, 0.0);
        assert_eq!(eval.per_label[1].support, 0);
    }

    #[test]
    fn test_display() {
        let eval = EvaluationResult::compute(&[0, 1], &[0, 1], &labels());
        let text = eval.to_string();
        assert!(text.contains("Accuracy: 1.0000"));
        assert!(text.contains("rows = actual"));
    }
}
