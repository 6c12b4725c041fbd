use database::request::model::{RequestCategory, RequestStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// 筹款目标（创建后不可变，不存在更新入口）
#[derive(Clone, Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct RequestTargetDto {
    /// 目标金额，0表示不设上限
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub currency_symbol: Option<String>,
    pub network_name: Option<String>,
    pub expected_chain_id: Option<u64>,
}

/// 创建筹款请求的请求体
#[derive(Clone, Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct CreateRequestDto {
    #[validate(length(min = 1, max = 150))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    pub category: Option<RequestCategory>,

    #[validate]
    pub target: RequestTargetDto,
}

/// 更新请求状态的请求体
///
/// status枚举在反序列化阶段校验，非法状态直接422。
#[derive(Clone, Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct UpdateRequestStatusDto {
    pub status: RequestStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_length_limits() {
        let dto = CreateRequestDto {
            title: "a".repeat(151),
            description: "desc".to_string(),
            category: None,
            target: RequestTargetDto {
                amount: 1.0,
                currency_symbol: None,
                network_name: None,
                expected_chain_id: None,
            },
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_negative_target_rejected() {
        let dto = CreateRequestDto {
            title: "Help".to_string(),
            description: "desc".to_string(),
            category: Some(RequestCategory::Medical),
            target: RequestTargetDto {
                amount: -1.0,
                currency_symbol: None,
                network_name: None,
                expected_chain_id: None,
            },
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_invalid_status_rejected_at_deserialization() {
        let result = serde_json::from_str::<UpdateRequestStatusDto>(r#"{"status":"archived"}"#);
        assert!(result.is_err());

        let dto = serde_json::from_str::<UpdateRequestStatusDto>(r#"{"status":"closed"}"#).unwrap();
        assert_eq!(dto.status, RequestStatus::Closed);
    }
}
