pub mod analyze;

pub use analyze::{AnalysisHandler, AnalyzeError};
