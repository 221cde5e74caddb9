//! Dataset exploration summary

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::LabeledRecord;
use crate::logic::features::Category;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl NumericStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

/// Shape and distribution of a labelled dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub label_counts: BTreeMap<String, usize>,
    pub sex_counts: BTreeMap<&'static str, usize>,
    pub bp_counts: BTreeMap<&'static str, usize>,
    pub cholesterol_counts: BTreeMap<&'static str, usize>,
    pub age: Option<NumericStats>,
    pub na_to_k: Option<NumericStats>,
}

/// Summarize row count, label distribution and per-field statistics
pub fn summarize(rows: &[LabeledRecord]) -> DatasetSummary {
    let mut summary = DatasetSummary {
        rows: rows.len(),
        label_counts: BTreeMap::new(),
        sex_counts: BTreeMap::new(),
        bp_counts: BTreeMap::new(),
        cholesterol_counts: BTreeMap::new(),
        age: NumericStats::from_values(rows.iter().map(|r| f64::from(r.record.age()))),
        na_to_k: NumericStats::from_values(rows.iter().map(|r| r.record.na_to_k())),
    };

    for row in rows {
        *summary.label_counts.entry(row.label.clone()).or_insert(0) += 1;
        *summary.sex_counts.entry(row.record.sex().label()).or_insert(0) += 1;
        *summary.bp_counts.entry(row.record.blood_pressure().label()).or_insert(0) += 1;
        *summary
            .cholesterol_counts
            .entry(row.record.cholesterol().label())
            .or_insert(0) += 1;
    }

    summary
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;

        writeln!(f, "Drug distribution:")?;
        for (label, count) in &self.label_counts {
            writeln!(f, "  {:<8} {}", label, count)?;
        }

        let counts = [
            ("Sex", &self.sex_counts),
            ("BP", &self.bp_counts),
            ("Cholesterol", &self.cholesterol_counts),
        ];
        for (field, map) in counts {
            let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            writeln!(f, "{}: {}", field, parts.join(", "))?;
        }

        for (field, stats) in [("Age", &self.age), ("Na_to_K", &self.na_to_k)] {
            if let Some(s) = stats {
                writeln!(f, "{}: min {:.2}, mean {:.2}, max {:.2}", field, s.min, s.mean, s.max)?;
            }
        }

        Ok(())
    }
}
