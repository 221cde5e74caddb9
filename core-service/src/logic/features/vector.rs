//! Feature Vector - schema-driven encoding
//!
//! Every vector is produced against a [`FeatureSchema`] and carries its
//! layout hash, so a vector can never be silently fed to a model fit on a
//! different layout.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::buckets::{AgeBucket, NaToKBucket};
use super::layout::{column_name, FeatureSchema, UnknownCategoryPolicy};
use super::record::{Category, PatientRecord};
use crate::error::{CoreError, CoreResult};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Hash of the schema this vector was encoded against
    pub layout_hash: u32,
    /// One value per schema column, in schema order
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get feature by column name
    pub fn get_by_name(&self, schema: &FeatureSchema, name: &str) -> Option<f32> {
        schema.column_index(name).and_then(|i| self.values.get(i).copied())
    }

    /// Validate that this vector matches `schema`
    pub fn validate(&self, schema: &FeatureSchema) -> CoreResult<()> {
        if self.layout_hash != schema.layout_hash() || self.values.len() != schema.len() {
            return Err(CoreError::Encoding(format!(
                "feature vector layout {:08x} ({} values) does not match schema {:08x} ({} columns)",
                self.layout_hash,
                self.values.len(),
                schema.layout_hash(),
                schema.len()
            )));
        }
        Ok(())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self, schema: &FeatureSchema) -> serde_json::Value {
        serde_json::json!({
            "layout_hash": self.layout_hash,
            "active_columns": schema.columns().iter()
                .zip(self.values.iter())
                .filter(|(_, v)| **v != 0.0)
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>(),
        })
    }
}

// ============================================================================
// ENCODING
// ============================================================================

impl FeatureSchema {
    /// Encode one record against this schema
    pub fn encode_one(&self, record: &PatientRecord) -> CoreResult<FeatureVector> {
        self.encode_with(record, self.policy())
    }

    /// Encode one record, leaving groups whose category has no column at zero.
    ///
    /// Used for held-out rows, whatever the schema's policy.
    pub fn encode_aligned(&self, record: &PatientRecord) -> CoreResult<FeatureVector> {
        self.encode_with(record, UnknownCategoryPolicy::ZeroRow)
    }

    /// Encode many records into a dense (rows × columns) matrix
    pub fn encode_matrix(&self, records: &[PatientRecord]) -> CoreResult<Array2<f32>> {
        self.matrix_with(records, self.policy())
    }

    /// [`encode_matrix`](Self::encode_matrix) with [`encode_aligned`](Self::encode_aligned) rows
    pub fn encode_matrix_aligned(&self, records: &[PatientRecord]) -> CoreResult<Array2<f32>> {
        self.matrix_with(records, UnknownCategoryPolicy::ZeroRow)
    }

    /// Number of records with at least one category missing from this schema
    pub fn count_unseen(&self, records: &[PatientRecord]) -> usize {
        records
            .iter()
            .filter(|r| self.encode_with(r, UnknownCategoryPolicy::Reject).is_err())
            .count()
    }

    fn encode_with(
        &self,
        record: &PatientRecord,
        policy: UnknownCategoryPolicy,
    ) -> CoreResult<FeatureVector> {
        let mut values = vec![0.0f32; self.len()];

        self.set_hot(&mut values, record.sex(), policy)?;
        self.set_hot(&mut values, record.blood_pressure(), policy)?;
        self.set_hot(&mut values, record.cholesterol(), policy)?;
        self.set_hot(&mut values, AgeBucket::of(record.age()), policy)?;
        self.set_hot(&mut values, NaToKBucket::of(record.na_to_k()), policy)?;

        Ok(FeatureVector {
            layout_hash: self.layout_hash(),
            values,
        })
    }

    fn matrix_with(
        &self,
        records: &[PatientRecord],
        policy: UnknownCategoryPolicy,
    ) -> CoreResult<Array2<f32>> {
        let width = self.len();
        let mut data = Vec::with_capacity(records.len() * width);
        for record in records {
            data.extend(self.encode_with(record, policy)?.values);
        }

        Array2::from_shape_vec((records.len(), width), data)
            .map_err(|e| CoreError::Encoding(format!("matrix shape error: {}", e)))
    }

    fn set_hot<C: Category>(
        &self,
        values: &mut [f32],
        value: C,
        policy: UnknownCategoryPolicy,
    ) -> CoreResult<()> {
        let name = column_name(C::GROUP, value.label());
        match (self.column_index(&name), policy) {
            (Some(idx), _) => {
                values[idx] = 1.0;
                Ok(())
            }
            (None, UnknownCategoryPolicy::ZeroRow) => Ok(()),
            (None, UnknownCategoryPolicy::Reject) => Err(CoreError::Encoding(format!(
                "{} = {} was not seen at training time",
                C::GROUP,
                value.label()
            ))),
        }
    }
}

/// Encode `records` against `schema`, one vector per record
pub fn encode(records: &[PatientRecord], schema: &FeatureSchema) -> CoreResult<Vec<FeatureVector>> {
    records.iter().map(|r| schema.encode_one(r)).collect()
}

/// Derive the column layout from a training table
pub fn derive_schema(
    records: &[PatientRecord],
    policy: UnknownCategoryPolicy,
) -> CoreResult<FeatureSchema> {
    FeatureSchema::derive(records, policy)
}
