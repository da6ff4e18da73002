pub mod config;
pub mod models;
pub mod image;
pub mod classify;
pub mod web;
pub mod utils;

// 重新导出主要类型
pub use classify::{ClassificationPipeline, ClassificationResult};
pub use config::Config;
pub use crate::image::PredictionResult;
pub use utils::error::ClassifyError;

pub type Result<T> = std::result::Result<T, ClassifyError>;
