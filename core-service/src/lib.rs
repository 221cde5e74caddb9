//! Drug Classification Core
//!
//! Feature contract, training pipeline and model lifecycle for the drug
//! classification service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DRUGCLF CORE                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │ dataset    │──▶│ features     │──▶│ model              │  │
//! │  │ csv/split/ │   │ buckets +    │   │ forest, metrics,   │  │
//! │  │ smote      │   │ schema       │   │ bundle storage     │  │
//! │  └────────────┘   └──────────────┘   └─────────┬──────────┘  │
//! │                                                ▼             │
//! │                                      ┌────────────────────┐  │
//! │                                      │ lifecycle          │  │
//! │                                      │ (active snapshot)  │  │
//! │                                      └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod logic;

pub use config::PipelineConfig;
pub use error::{CoreError, CoreResult};
pub use logic::dataset::LabeledRecord;
pub use logic::features::{
    derive_schema, encode, FeatureSchema, FeatureVector, PatientRecord, RawPatient,
    UnknownCategoryPolicy,
};
pub use logic::lifecycle::{Health, ModelInfo, ModelLifecycle};
pub use logic::model::{EvaluationResult, Hyperparameters, TrainedModel};
