pub mod loader;
pub mod preprocessing;
pub mod postprocessing;

pub use loader::ImageLoader;
pub use preprocessing::{ImagePreprocessor, InputTensor};
pub use postprocessing::{LabelScore, PredictionResult, Postprocessor};
