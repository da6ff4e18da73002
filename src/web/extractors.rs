use crate::{utils::error::ClassifyError, web::handlers::ApiFailure};
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;

/// 请求ID头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 读取请求ID，缺失时生成新的 uuid
fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// 验证的JSON提取器，失败时返回带请求ID的错误响应
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id_from_headers(req.headers());

        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|err| {
            ApiFailure::new(
                ClassifyError::Validation(format!("JSON parse error: {}", err.body_text())),
                &request_id,
            )
        })?;

        value.validate().map_err(|err| {
            ApiFailure::new(ClassifyError::Validation(err.to_string()), &request_id)
        })?;

        Ok(ValidatedJson(value))
    }
}

/// 验证trait
pub trait Validate {
    type Error: std::fmt::Display;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// 为分类请求实现验证
impl Validate for crate::web::handlers::ClassifyJsonRequest {
    type Error = String;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }

        Ok(())
    }
}

/// 请求ID提取器，优先使用 X-Request-ID 头
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestId(request_id_from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn request_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("scan-7"));
        assert_eq!(request_id_from_headers(&headers), "scan-7");
    }

    #[test]
    fn request_id_falls_back_to_uuid() {
        let id = request_id_from_headers(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&id).is_ok(), "{id}");
    }
}
