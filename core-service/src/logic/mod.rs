//! Logic Module - pipeline stages
//!
//! - `dataset/` - CSV loading, exploration summary, split, SMOTE
//! - `features/` - Validation, binning, schema-driven one-hot encoding
//! - `model/` - Random forest training, evaluation, bundle storage
//! - `lifecycle` - Active model slot shared by predict and retrain

pub mod dataset;
pub mod features;
pub mod lifecycle;
pub mod model;
