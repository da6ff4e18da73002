pub mod handlers;
pub mod middleware;
pub mod extractors;

use crate::{
    classify::ClassificationPipeline,
    models::ModelManager,
    utils::error::ClassifyError,
    web::{extractors::RequestId, handlers::ApiFailure},
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: ClassificationPipeline,
}

impl AppState {
    pub fn new(config: Config, models: Arc<ModelManager>) -> Self {
        Self {
            config,
            pipeline: ClassificationPipeline::new(models),
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 模型只加载一次，由所有请求共享
    let models = Arc::new(ModelManager::load(config.clone()));
    let state = AppState::new(config.clone(), models);

    let app = create_app(state);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ClassifyError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /classify        - JSON base64 upload");
    tracing::info!("  POST /classify/upload - Multipart file upload");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = &state.config.server_config;
    let max_request_size = server_config.max_request_size;
    let request_timeout = Duration::from_secs(server_config.request_timeout);

    Router::new()
        .route("/classify", post(handlers::classify_json_handler))
        .route("/classify/upload", post(handlers::classify_upload_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        // 由 RequestBodyLimitLayer 统一限制请求体大小
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_request_size))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        // 没有 X-Request-ID 的请求在此生成，并回写到响应头
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> std::result::Result<Json<serde_json::Value>, ApiFailure> {
    state
        .pipeline
        .models()
        .health_check()
        .map_err(|e| ApiFailure::new(e, &request_id))?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.pipeline.models().stats();

    Json(json!({
        "service": "Tumor Classification Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "features": {
            "json_upload": true,
            "multipart_upload": true,
        }
    }))
}
