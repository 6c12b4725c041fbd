use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use mongodb::bson::oid::ObjectId;
use utils::AppError;

/// 已认证用户提取器
///
/// 会话认证是外部协作方：上游凭证网关完成认证后通过 `x-user-id`
/// 请求头注入调用者的用户ID，这里只负责解析与拒绝未认证请求。
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub ObjectId);

const USER_ID_HEADER: &str = "x-user-id";

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let user_id = header
            .parse::<ObjectId>()
            .map_err(|_| AppError::Unauthorized("Invalid user identity".to_string()))?;

        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_valid_object_id_accepted() {
        let id = ObjectId::new();
        let request = Request::builder()
            .uri("/")
            .header(USER_ID_HEADER, id.to_hex())
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let AuthUser(parsed) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(parsed, id);
    }

    #[tokio::test]
    async fn test_malformed_id_rejected() {
        let request = Request::builder()
            .uri("/")
            .header(USER_ID_HEADER, "not-an-object-id")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
