#![forbid(unsafe_code)]

pub mod assessment;
pub mod error;

pub use scent_core::Clock;

pub use assessment::{AssessmentEngine, ProgressReport};
pub use error::EngineError;
