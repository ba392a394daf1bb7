mod engine;
mod report;

pub use crate::error::EngineError;
pub use engine::AssessmentEngine;
pub use report::ProgressReport;
