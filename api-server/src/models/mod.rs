//! Request and response bodies

pub mod patient;
pub mod retrain;

pub use patient::*;
pub use retrain::*;
