pub mod error;

pub use error::ClassifyError;
