pub mod engine;
pub mod classifier;
pub mod manager;

pub use engine::{InferenceEngine, OutputVector};
pub use classifier::OnnxClassifier;
pub use manager::{ModelManager, ModelStats};
