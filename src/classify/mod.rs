pub mod pipeline;
pub mod types;

pub use pipeline::{ClassificationPipeline, OUTPUT_SHAPE};
pub use types::{ClassificationResult, ClassificationStats};
