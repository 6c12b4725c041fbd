use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 链上交易状态
///
/// 记录服务只在客户端观察到确认之后被调用，因此创建时默认confirmed，
/// 不存在异步复核流程。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// 捐赠金额与链网络信息
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DonationAmount {
    pub value: f64,
    pub currency_symbol: String,
    pub network_name: String,
    pub expected_chain_id: u64,
}

/// 捐赠提交时的客户端元信息（服务端从请求头采集）
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DonationMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
}

/// 捐赠记录模型
///
/// 平台认可的一次完成的链上转账，tx_hash全局唯一（小写规范化），
/// 是exactly-once记录的唯一去重键。写入后不可变、不可删除（审计轨迹）。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Donation {
    /// MongoDB文档ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    /// 目标筹款请求
    #[schema(value_type = String)]
    pub request: ObjectId,
    /// 捐赠者
    #[schema(value_type = String)]
    pub from_user: ObjectId,
    /// 接收者（必须等于请求所有者）
    #[schema(value_type = String)]
    pub to_user: ObjectId,
    /// 捐赠者钱包地址（小写）
    pub from_wallet: String,
    /// 接收者钱包地址（小写）
    pub to_wallet: String,
    pub amount: DonationAmount,
    /// 链上交易哈希（小写，唯一索引）
    pub tx_hash: String,
    pub tx_status: TxStatus,
    /// 区块高度（仅展示用，不参与一致性决策）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// 链上交易时间戳（unix秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_timestamp: Option<i64>,
    pub meta: DonationMeta,
    /// 记录创建时间（unix秒）
    pub created_at: u64,
    /// 记录更新时间（unix秒）
    pub updated_at: u64,
}

impl Donation {
    pub fn created_now(mut self) -> Self {
        let now = Utc::now().timestamp() as u64;
        self.created_at = now;
        self.updated_at = now;
        self
    }
}

/// 地址/哈希小写规范化（记录与查询统一走这里，保证去重键一致）
pub fn normalize_hex(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 捐赠列表查询参数
#[derive(Debug, Clone, Default)]
pub struct DonationQueryParams {
    pub request: Option<ObjectId>,
    pub from_user: Option<ObjectId>,
    pub to_user: Option<ObjectId>,
    pub from_wallet: Option<String>,
    pub to_wallet: Option<String>,
    pub page: u64,
    pub limit: u64,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl DonationQueryParams {
    /// page/limit归一化：page最小1，limit限制在1..=100
    pub fn normalized(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        if self.limit == 0 {
            self.limit = 10;
        }
        self.limit = self.limit.min(100);
        self
    }
}

/// 分页响应信封
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PagedDonations {
    pub items: Vec<Donation>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PagedDonations {
    pub fn new(items: Vec<Donation>, total: u64, page: u64, limit: u64) -> Self {
        // totalPages = ceil(total/limit)，空集合时保持1
        let total_pages = if total == 0 { 1 } else { (total + limit - 1) / limit };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hex() {
        assert_eq!(normalize_hex("0xABCdef123"), "0xabcdef123");
        assert_eq!(normalize_hex("  0xAAA  "), "0xaaa");
        assert_eq!(normalize_hex("0xaaa"), "0xaaa");
    }

    #[test]
    fn test_query_params_normalized() {
        let params = DonationQueryParams::default().normalized();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);

        let params = DonationQueryParams {
            page: 3,
            limit: 500,
            ..Default::default()
        }
        .normalized();
        assert_eq!(params.page, 3);
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn test_paged_total_pages() {
        let paged = PagedDonations::new(vec![], 0, 1, 10);
        assert_eq!(paged.total_pages, 1);

        let paged = PagedDonations::new(vec![], 10, 1, 10);
        assert_eq!(paged.total_pages, 1);

        let paged = PagedDonations::new(vec![], 11, 2, 10);
        assert_eq!(paged.total_pages, 2);

        let paged = PagedDonations::new(vec![], 21, 1, 10);
        assert_eq!(paged.total_pages, 3);
    }

    #[test]
    fn test_tx_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TxStatus::Confirmed).unwrap(), "\"confirmed\"");
        assert!(serde_json::from_str::<TxStatus>("\"reverted\"").is_err());
    }
}
