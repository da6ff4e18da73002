use crate::{
    classify::{ClassificationPipeline, ClassificationResult},
    utils::error::ClassifyError,
    web::{
        extractors::{RequestId, ValidatedJson},
        AppState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct ClassifyJsonRequest {
    /// Base64编码的图像数据，可带 data URL 前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: String, message: String, request_id: String) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError { code, message }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 携带请求ID的失败响应
#[derive(Debug)]
pub struct ApiFailure {
    pub error: ClassifyError,
    pub request_id: String,
}

impl ApiFailure {
    pub fn new(error: ClassifyError, request_id: &str) -> Self {
        Self {
            error,
            request_id: request_id.to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.error.status_code();

        tracing::error!(
            "Request failed: request_id={}, {} ({})",
            self.request_id,
            self.error,
            status
        );

        let body = ApiResponse::error(
            self.error.error_code().to_string(),
            self.error.to_string(),
            self.request_id,
        );

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiFailure>;

/// JSON base64上传处理器
pub async fn classify_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ClassifyJsonRequest>,
) -> ApiResult<ClassificationResult> {
    let start_time = Instant::now();

    tracing::info!(
        "Processing JSON classification request: request_id={}, payload={} chars",
        request_id,
        request.image.len()
    );

    let result = run_blocking(state.pipeline.clone(), move |pipeline| {
        pipeline.classify_base64(&request.image)
    })
    .await
    .map_err(|e| ApiFailure::new(e, &request_id))?;

    tracing::info!(
        "JSON classification completed: request_id={}, result='{}', time={:.3}s",
        request_id,
        result.display,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// Multipart文件上传处理器
pub async fn classify_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> ApiResult<ClassificationResult> {
    let start_time = Instant::now();

    tracing::info!(
        "Processing multipart classification request: request_id={}",
        request_id
    );

    let image_data = read_image_field(multipart)
        .await
        .map_err(|e| ApiFailure::new(e, &request_id))?;

    let result = run_blocking(state.pipeline.clone(), move |pipeline| {
        pipeline.classify_bytes(&image_data)
    })
    .await
    .map_err(|e| ApiFailure::new(e, &request_id))?;

    tracing::info!(
        "Upload classification completed: request_id={}, result='{}', time={:.3}s",
        request_id,
        result.display,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// 读取 multipart 中的 "file" 字段，内容类型不做限制，由解码器判断
async fn read_image_field(mut multipart: Multipart) -> Result<Bytes> {
    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ClassifyError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field.content_type().unwrap_or("unspecified").to_string();

                let data = field.bytes().await.map_err(|e| {
                    ClassifyError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                if data.is_empty() {
                    return Err(ClassifyError::InvalidInput("Empty file".to_string()));
                }

                tracing::debug!("Received file: {} bytes ({})", data.len(), content_type);
                image_data = Some(data);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    image_data.ok_or_else(|| ClassifyError::InvalidInput("No image file provided".to_string()))
}

/// 在阻塞线程池上执行解码和推理
async fn run_blocking<F>(pipeline: ClassificationPipeline, f: F) -> Result<ClassificationResult>
where
    F: FnOnce(&ClassificationPipeline) -> Result<ClassificationResult> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&pipeline))
        .await
        .map_err(|e| ClassifyError::Internal(format!("Classification task failed: {}", e)))?
}
