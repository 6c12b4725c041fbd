use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// 应用统一错误类型
///
/// Service与Repository层统一返回AppResult，由axum在响应边界
/// 将错误映射为对应的HTTP状态码与 `{"error": ...}` 响应体。
#[derive(Debug, Error)]
pub enum AppError {
    /// 资源不存在 -> 404
    #[error("{0}")]
    NotFound(String),

    /// 业务状态冲突（重复记录等） -> 409
    #[error("{0}")]
    Conflict(String),

    /// 请求不符合业务规则 -> 400
    #[error("{0}")]
    BadRequest(String),

    /// 未认证 -> 401
    #[error("{0}")]
    Unauthorized(String),

    /// 无权操作 -> 403
    #[error("{0}")]
    Forbidden(String),

    /// 功能未开放 -> 503
    #[error("{0}")]
    ServiceUnavailable(String),

    /// DTO校验失败 -> 422
    #[error("validation error in request body")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error(transparent)]
    MongoError(#[from] mongodb::error::Error),

    #[error(transparent)]
    BsonSerError(#[from] mongodb::bson::ser::Error),

    #[error(transparent)]
    ObjectIdError(#[from] mongodb::bson::oid::Error),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),

    #[error("{0}")]
    InternalServerErrorWithContext(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 基础设施错误不向客户端泄漏内部细节
        let message = match &self {
            AppError::MongoError(e) => {
                tracing::error!("🔴 database error: {}", e);
                "Server error".to_string()
            }
            AppError::BsonSerError(e) => {
                tracing::error!("🔴 bson serialization error: {}", e);
                "Server error".to_string()
            }
            AppError::AnyhowError(e) => {
                tracing::error!("🔴 internal error: {}", e);
                "Server error".to_string()
            }
            AppError::ValidationError(errors) => {
                return (status, Json(json!({ "error": "Invalid request body", "details": errors }))).into_response();
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::ServiceUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
