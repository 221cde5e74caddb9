//! Dataset Module - labelled training data
//!
//! Loads the drug200 CSV layout (`Age,Sex,BP,Cholesterol,Na_to_K,Drug`),
//! validating every row into a [`LabeledRecord`] at the boundary.

pub mod smote;
pub mod split;
pub mod summary;
#[cfg(any(test, feature = "test-support"))]
pub mod synthetic;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::logic::features::{PatientRecord, RawPatient};

pub use smote::Smote;
pub use split::{train_test_split, SplitIndices};
pub use summary::{summarize, DatasetSummary};

/// Name of the target column
pub const LABEL_COLUMN: &str = "Drug";

/// Input columns, in dataset order
pub const FEATURE_COLUMNS: [&str; 5] = ["Age", "Sex", "BP", "Cholesterol", "Na_to_K"];

/// One training row: a validated patient and the prescribed drug
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRecord {
    pub record: PatientRecord,
    pub label: String,
}

/// Load a dataset from a CSV file
pub fn load_csv(path: &Path) -> CoreResult<Vec<LabeledRecord>> {
    let file = File::open(path).map_err(|e| {
        CoreError::Persistence(format!("cannot open dataset {}: {}", path.display(), e))
    })?;
    let records = from_reader(file)?;
    log::info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Parse a dataset from any CSV source
pub fn from_reader<R: Read>(reader: R) -> CoreResult<Vec<LabeledRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| CoreError::Schema(format!("unreadable dataset header: {}", e)))?
        .clone();

    let column = |name: &str| -> CoreResult<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            CoreError::Schema(format!("required field {:?} missing from dataset header", name))
        })
    };

    let [age, sex, bp, cholesterol, na_to_k] = [
        column(FEATURE_COLUMNS[0])?,
        column(FEATURE_COLUMNS[1])?,
        column(FEATURE_COLUMNS[2])?,
        column(FEATURE_COLUMNS[3])?,
        column(FEATURE_COLUMNS[4])?,
    ];
    let label = column(LABEL_COLUMN)?;

    let mut records = Vec::new();
    for (i, row) in csv_reader.records().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row = row.map_err(|e| CoreError::Validation(format!("line {}: {}", line, e)))?;

        let field = |idx: usize| row.get(idx).unwrap_or("");
        let invalid = |what: &str, e: &dyn std::fmt::Display| {
            CoreError::Validation(format!("line {}: invalid {}: {}", line, what, e))
        };

        let raw = RawPatient {
            age: field(age).parse().map_err(|e| invalid("Age", &e))?,
            sex: field(sex).to_string(),
            bp: field(bp).to_string(),
            cholesterol: field(cholesterol).to_string(),
            na_to_k: field(na_to_k).parse().map_err(|e| invalid("Na_to_K", &e))?,
        };
        let record = raw.validate().map_err(|e| invalid("record", &e))?;

        let drug = field(label);
        if drug.is_empty() {
            return Err(CoreError::Validation(format!("line {}: empty {}", line, LABEL_COLUMN)));
        }

        records.push(LabeledRecord {
            record,
            label: drug.to_string(),
        });
    }

    Ok(records)
}

/// Split labelled rows into parallel record/label vectors
pub fn unzip(rows: &[LabeledRecord]) -> (Vec<PatientRecord>, Vec<String>) {
    rows.iter().map(|r| (r.record, r.label.clone())).unzip()
}
