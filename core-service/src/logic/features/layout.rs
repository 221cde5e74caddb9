//! Feature Layout - the one-hot column contract
//!
//! **This file controls the feature schema.**
//!
//! The column universe is a training-time artifact: it is derived once from
//! the training partition, frozen into a [`FeatureSchema`], persisted with
//! the model and replayed for every later encoding. A single prediction
//! request never carries enough category diversity to rebuild it.
//!
//! ## Rules
//! 1. Group order is fixed: Sex, BP, Cholesterol, Age_binned, Na_to_K_binned
//! 2. Sex/BP/Cholesterol list only observed categories, sorted
//! 3. Bucket groups always list every bucket, in edge order
//! 4. Changing any of the above → increment SCHEMA_VERSION

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::buckets::{AgeBucket, NaToKBucket};
use super::record::{BloodPressure, Category, Cholesterol, PatientRecord, Sex};
use crate::error::{CoreError, CoreResult};

// ============================================================================
// SCHEMA VERSION
// ============================================================================

/// Current schema layout version
/// MUST be incremented when the derivation rules change
pub const SCHEMA_VERSION: u8 = 1;

/// One-hot groups in column order
pub const GROUPS: [&str; 5] = [
    Sex::GROUP,
    BloodPressure::GROUP,
    Cholesterol::GROUP,
    AgeBucket::GROUP,
    NaToKBucket::GROUP,
];

/// Name of the column holding `category` within `group`
pub fn column_name(group: &str, category: &str) -> String {
    format!("{}_{}", group, category)
}

// ============================================================================
// UNKNOWN CATEGORY POLICY
// ============================================================================

/// What encoding does with a category that has no column in the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Fail with an encoding error
    #[default]
    Reject,
    /// Leave the whole group at zero
    ZeroRow,
}

impl UnknownCategoryPolicy {
    fn tag(&self) -> u8 {
        match self {
            UnknownCategoryPolicy::Reject => 0,
            UnknownCategoryPolicy::ZeroRow => 1,
        }
    }
}

impl FromStr for UnknownCategoryPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reject" => Ok(UnknownCategoryPolicy::Reject),
            "zero_row" | "zero" => Ok(UnknownCategoryPolicy::ZeroRow),
            other => Err(CoreError::Validation(format!(
                "unknown category policy {:?} (expected reject or zero_row)",
                other
            ))),
        }
    }
}

impl fmt::Display for UnknownCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownCategoryPolicy::Reject => f.write_str("reject"),
            UnknownCategoryPolicy::ZeroRow => f.write_str("zero_row"),
        }
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version, policy and ordered column names.
/// Used to detect layout tampering or mismatches at load time.
pub fn compute_layout_hash(version: u8, policy: UnknownCategoryPolicy, columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[version, policy.tag()]);

    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// Ordered one-hot column names frozen at training time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    version: u8,
    layout_hash: u32,
    policy: UnknownCategoryPolicy,
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Derive the column layout from a training table
    pub fn derive(records: &[PatientRecord], policy: UnknownCategoryPolicy) -> CoreResult<Self> {
        if records.is_empty() {
            return Err(CoreError::Schema(
                "cannot derive a feature schema from an empty training table".to_string(),
            ));
        }

        let mut columns = Vec::new();
        columns.extend(observed_columns(records, |r| r.sex()));
        columns.extend(observed_columns(records, |r| r.blood_pressure()));
        columns.extend(observed_columns(records, |r| r.cholesterol()));
        columns.extend(all_columns::<AgeBucket>());
        columns.extend(all_columns::<NaToKBucket>());

        let schema = Self::from_columns(columns, policy)?;
        log::debug!(
            "Derived feature schema: {} columns (hash {:08x}, policy {})",
            schema.len(),
            schema.layout_hash,
            schema.policy
        );
        Ok(schema)
    }

    /// Build a schema from an explicit column list
    pub fn from_columns(columns: Vec<String>, policy: UnknownCategoryPolicy) -> CoreResult<Self> {
        let schema = Self {
            version: SCHEMA_VERSION,
            layout_hash: compute_layout_hash(SCHEMA_VERSION, policy, &columns),
            policy,
            columns,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column index by name (O(n) but columns are few)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check version, hash and column sanity.
    ///
    /// Every column must belong to a known group, appear once, and every
    /// group must keep at least one column.
    pub fn validate(&self) -> CoreResult<()> {
        if self.version != SCHEMA_VERSION {
            return Err(CoreError::Schema(format!(
                "unsupported schema version {} (expected {})",
                self.version, SCHEMA_VERSION
            )));
        }

        let expected = compute_layout_hash(self.version, self.policy, &self.columns);
        if expected != self.layout_hash {
            return Err(CoreError::Schema(format!(
                "layout hash mismatch: stored {:08x}, computed {:08x}",
                self.layout_hash, expected
            )));
        }

        let known: HashSet<String> = all_columns::<Sex>()
            .chain(all_columns::<BloodPressure>())
            .chain(all_columns::<Cholesterol>())
            .chain(all_columns::<AgeBucket>())
            .chain(all_columns::<NaToKBucket>())
            .collect();

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !known.contains(column) {
                return Err(CoreError::Schema(format!("unknown column {:?}", column)));
            }
            if !seen.insert(column.as_str()) {
                return Err(CoreError::Schema(format!("duplicate column {:?}", column)));
            }
        }

        for group in GROUPS {
            let prefix = format!("{}_", group);
            if !self.columns.iter().any(|c| c.starts_with(&prefix)) {
                return Err(CoreError::Schema(format!("group {} has no columns", group)));
            }
        }

        Ok(())
    }
}

/// Sorted labels of the categories that actually occur in `records`
fn observed_columns<C, F>(records: &[PatientRecord], field: F) -> impl Iterator<Item = String>
where
    C: Category,
    F: Fn(&PatientRecord) -> C,
{
    let labels: BTreeSet<&'static str> = records.iter().map(|r| field(r).label()).collect();
    labels.into_iter().map(|label| column_name(C::GROUP, label))
}

/// Every category of `C`, in canonical order
fn all_columns<C: Category>() -> impl Iterator<Item = String> {
    C::ALL.iter().map(|c| column_name(C::GROUP, c.label()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::RawPatient;

    fn record(age: i64, sex: &str, bp: &str, chol: &str, ratio: f64) -> PatientRecord {
        RawPatient {
            age,
            sex: sex.to_string(),
            bp: bp.to_string(),
            cholesterol: chol.to_string(),
            na_to_k: ratio,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_derive_full_layout() {
        let records = vec![
            record(23, "F", "HIGH", "HIGH", 25.3),
            record(47, "M", "LOW", "HIGH", 13.1),
            record(61, "F", "NORMAL", "NORMAL", 7.8),
        ];
        let schema = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();

        let expected = [
            "Sex_F", "Sex_M",
            "BP_HIGH", "BP_LOW", "BP_NORMAL",
            "Cholesterol_HIGH", "Cholesterol_NORMAL",
            "Age_binned_<20s", "Age_binned_20s", "Age_binned_30s", "Age_binned_40s",
            "Age_binned_50s", "Age_binned_60s", "Age_binned_>60s",
            "Na_to_K_binned_<10", "Na_to_K_binned_10-20", "Na_to_K_binned_20-30",
            "Na_to_K_binned_>30",
        ];
        assert_eq!(schema.columns(), expected);
        assert_eq!(schema.len(), 18);
    }

    #[test]
    fn test_derive_only_observed_categories() {
        let records = vec![record(45, "M", "HIGH", "NORMAL", 15.5)];
        let schema = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();

        assert_eq!(schema.column_index("Sex_M"), Some(0));
        assert_eq!(schema.column_index("Sex_F"), None);
        assert_eq!(schema.column_index("BP_HIGH"), Some(1));
        assert_eq!(schema.column_index("BP_LOW"), None);
        // Bucket groups are always complete
        assert_eq!(schema.len(), 1 + 1 + 1 + 7 + 4);
    }

    #[test]
    fn test_derive_empty_table_fails() {
        let err = FeatureSchema::derive(&[], UnknownCategoryPolicy::Reject).unwrap_err();
        assert!(matches!(err, CoreError::Schema(_)));
    }

    #[test]
    fn test_layout_hash_consistency() {
        let records = vec![record(45, "M", "HIGH", "NORMAL", 15.5)];
        let a = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();
        let b = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();
        assert_eq!(a.layout_hash(), b.layout_hash());
        assert_ne!(a.layout_hash(), 0);
    }

    #[test]
    fn test_policy_changes_hash() {
        let records = vec![record(45, "M", "HIGH", "NORMAL", 15.5)];
        let reject = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();
        let zero = FeatureSchema::derive(&records, UnknownCategoryPolicy::ZeroRow).unwrap();
        assert_eq!(reject.columns(), zero.columns());
        assert_ne!(reject.layout_hash(), zero.layout_hash());
    }

    #[test]
    fn test_validate_rejects_tampered_hash() {
        let records = vec![record(45, "M", "HIGH", "NORMAL", 15.5)];
        let mut schema = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();
        schema.layout_hash = !schema.layout_hash;
        assert!(matches!(schema.validate(), Err(CoreError::Schema(_))));
    }

    #[test]
    fn test_validate_rejects_version_mismatch() {
        let records = vec![record(45, "M", "HIGH", "NORMAL", 15.5)];
        let mut schema = FeatureSchema::derive(&records, UnknownCategoryPolicy::Reject).unwrap();
        schema.version = SCHEMA_VERSION + 1;
        assert!(matches!(schema.validate(), Err(CoreError::Schema(_))));
    }

    #[test]
    fn test_from_columns_rejects_unknown_and_duplicate() {
        let mut columns: Vec<String> = all_columns::<Sex>()
            .chain(all_columns::<BloodPressure>())
            .chain(all_columns::<Cholesterol>())
            .chain(all_columns::<AgeBucket>())
            .chain(all_columns::<NaToKBucket>())
            .collect();
        assert!(FeatureSchema::from_columns(columns.clone(), UnknownCategoryPolicy::Reject).is_ok());

        columns.push("Sex_M".to_string());
        assert!(FeatureSchema::from_columns(columns.clone(), UnknownCategoryPolicy::Reject).is_err());

        columns.pop();
        columns.push("BP_EXTREME".to_string());
        assert!(FeatureSchema::from_columns(columns, UnknownCategoryPolicy::Reject).is_err());
    }

    #[test]
    fn test_from_columns_rejects_missing_group() {
        let columns: Vec<String> = all_columns::<Sex>()
            .chain(all_columns::<BloodPressure>())
            .chain(all_columns::<AgeBucket>())
            .chain(all_columns::<NaToKBucket>())
            .collect();
        let err = FeatureSchema::from_columns(columns, UnknownCategoryPolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("Cholesterol"));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("reject".parse::<UnknownCategoryPolicy>().unwrap(), UnknownCategoryPolicy::Reject);
        assert_eq!("zero-row".parse::<UnknownCategoryPolicy>().unwrap(), UnknownCategoryPolicy::ZeroRow);
        assert_eq!("ZERO_ROW".parse::<UnknownCategoryPolicy>().unwrap(), UnknownCategoryPolicy::ZeroRow);
        assert!("ignore".parse::<UnknownCategoryPolicy>().is_err());
    }
}
