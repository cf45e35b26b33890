use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP face of a [`DomainError`]. Always rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self.0 {
            DomainError::InvalidInput(msg)
            | DomainError::Unauthorized(msg)
            | DomainError::Forbidden(msg) => msg,
            not_found @ DomainError::NotFound(_) => not_found.to_string(),
            DomainError::Conflict(detail) => {
                tracing::warn!(%detail, "write lost a concurrent race");
                "Conflicting update, please retry".to_string()
            }
            DomainError::Unexpected(detail) => {
                tracing::error!(%detail, "request failed");
                "Server error".to_string()
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: DomainError) -> (StatusCode, serde_json::Value) {
        let res = ApiError(err).into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn maps_each_variant_to_one_status() {
        let (status, body) = body_of(DomainError::invalid("Content is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Content is required");

        let (status, body) = body_of(DomainError::NotFound("Post")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Post not found");

        let (status, _) = body_of(DomainError::Forbidden("Not authorized".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = body_of(DomainError::Unauthorized("No token provided".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = body_of(DomainError::Conflict("dup".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn never_leaks_unexpected_details() {
        let (status, body) = body_of(DomainError::unexpected("connection refused on 10.0.0.7")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Server error" }));
    }
}
