use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Inference engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Malformed model output: expected {expected} scores, got {actual}")]
    EmptyOutput { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClassifyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::Decode(_) => StatusCode::BAD_REQUEST,
            ClassifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifyError::Base64(_) => StatusCode::BAD_REQUEST,
            ClassifyError::Validation(_) => StatusCode::BAD_REQUEST,
            ClassifyError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifyError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifyError::Decode(_) => "IMAGE_DECODE_ERROR",
            ClassifyError::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
            ClassifyError::EmptyOutput { .. } => "EMPTY_OUTPUT",
            ClassifyError::Inference(_) => "INFERENCE_ERROR",
            ClassifyError::InvalidInput(_) => "INVALID_INPUT",
            ClassifyError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            ClassifyError::Validation(_) => "VALIDATION_ERROR",
            ClassifyError::Config(_) => "CONFIG_ERROR",
            ClassifyError::Base64(_) => "BASE64_DECODE_ERROR",
            ClassifyError::Ort(_) => "ORT_ERROR",
            ClassifyError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_scoped_errors_map_to_distinct_statuses() {
        let unavailable = ClassifyError::EngineUnavailable("model missing".to_string());
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.error_code(), "ENGINE_UNAVAILABLE");

        let empty = ClassifyError::EmptyOutput { expected: 4, actual: 3 };
        assert_eq!(empty.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(empty.to_string(), "Malformed model output: expected 4 scores, got 3");
    }

    #[test]
    fn unreadable_image_is_a_decode_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "scan.png");
        let err = ClassifyError::from(image::ImageError::IoError(io));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "IMAGE_DECODE_ERROR");
    }
}
