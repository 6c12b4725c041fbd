use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 筹款请求状态
///
/// 生命周期: 创建即为open；达到目标金额后在聚合更新中自动转为closed，
/// 或由所有者手动关闭；flagged为带外的审核状态。终态不再接受捐赠。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Closed,
    Flagged,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Closed => "closed",
            RequestStatus::Flagged => "flagged",
        }
    }
}

/// 筹款请求分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestCategory {
    Education,
    Medical,
    Disaster,
    Food,
    Other,
}

impl Default for RequestCategory {
    fn default() -> Self {
        RequestCategory::Other
    }
}

/// 筹款目标：金额与接受捐赠的链网络（创建后不可变）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestTarget {
    /// 目标金额，0表示不设上限
    pub amount: f64,
    pub currency_symbol: String,
    pub network_name: String,
    /// 捐赠必须发生在该链上
    pub expected_chain_id: u64,
}

/// 运行汇总
///
/// total_received与donors_count单调不减，只通过确认捐赠的
/// 聚合更新递增，从不重算、从不回退。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestTotals {
    pub total_received: f64,
    pub donors_count: u64,
    /// 最近一次捐赠时间（unix秒）
    pub last_donation_at: Option<u64>,
}

impl Default for RequestTotals {
    fn default() -> Self {
        Self {
            total_received: 0.0,
            donors_count: 0,
            last_donation_at: None,
        }
    }
}

/// 筹款请求模型
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FundingRequest {
    /// MongoDB文档ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    /// 请求所有者（创建后不可变）
    #[schema(value_type = String)]
    pub user: ObjectId,
    pub title: String,
    pub description: String,
    pub category: RequestCategory,
    pub target: RequestTarget,
    pub totals: RequestTotals,
    pub status: RequestStatus,
    /// 创建时间（unix秒）
    pub created_at: u64,
    /// 更新时间（unix秒）
    pub updated_at: u64,
}

impl FundingRequest {
    pub fn new(user: ObjectId, title: String, description: String, category: RequestCategory, target: RequestTarget) -> Self {
        let now = Utc::now().timestamp() as u64;
        Self {
            id: None,
            user,
            title,
            description,
            category,
            target,
            totals: RequestTotals::default(),
            status: RequestStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// 捐赠资格判断（仅用于预检读路径，权威检查在记录时由写路径完成）
    pub fn is_open_for_donations(&self) -> bool {
        self.status == RequestStatus::Open && !self.target_reached()
    }

    pub fn target_reached(&self) -> bool {
        self.target.amount > 0.0 && self.totals.total_received >= self.target.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request(amount: f64, received: f64, status: RequestStatus) -> FundingRequest {
        let mut request = FundingRequest::new(
            ObjectId::new(),
            "Test".to_string(),
            "Test description".to_string(),
            RequestCategory::Other,
            RequestTarget {
                amount,
                currency_symbol: "ETH".to_string(),
                network_name: "sepolia".to_string(),
                expected_chain_id: 11155111,
            },
        );
        request.totals.total_received = received;
        request.status = status;
        request
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RequestStatus::Open).unwrap(), "\"open\"");
        assert_eq!(serde_json::to_string(&RequestStatus::Closed).unwrap(), "\"closed\"");
        assert_eq!(serde_json::to_string(&RequestStatus::Flagged).unwrap(), "\"flagged\"");
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert!(serde_json::from_str::<RequestStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_open_request_accepts_donations() {
        let request = sample_request(2.0, 0.5, RequestStatus::Open);
        assert!(request.is_open_for_donations());
    }

    #[test]
    fn test_closed_request_rejects_donations() {
        let request = sample_request(2.0, 0.5, RequestStatus::Closed);
        assert!(!request.is_open_for_donations());
    }

    #[test]
    fn test_target_reached_blocks_donations() {
        let request = sample_request(1.0, 1.0, RequestStatus::Open);
        assert!(request.target_reached());
        assert!(!request.is_open_for_donations());

        // 未达到目标
        let request = sample_request(1.0, 0.99, RequestStatus::Open);
        assert!(!request.target_reached());

        // 目标为0表示不设上限
        let request = sample_request(0.0, 100.0, RequestStatus::Open);
        assert!(!request.target_reached());
    }
}
