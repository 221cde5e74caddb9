//! Features Module - Feature Transform
//!
//! Validated patient records → bucketed categories → one-hot vectors.
//! Schema derivation and encoding are separate steps so that inference-time
//! encoding always replays the training-time layout.

pub mod buckets;
pub mod layout;
pub mod record;
pub mod vector;


// Re-export common types
pub use buckets::{AgeBucket, NaToKBucket};
pub use layout::{FeatureSchema, UnknownCategoryPolicy, SCHEMA_VERSION};
pub use record::{BloodPressure, Category, Cholesterol, PatientRecord, RawPatient, Sex};
pub use vector::{derive_schema, encode, FeatureVector};
