use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// 捐赠金额（客户端声明）
///
/// 这是唯一接受的金额schema：源码中曾出现过扁平`network`字符串的
/// 旧版本形态，这里统一为 network_name + expected_chain_id，
/// 未知字段直接拒绝而不是兼容接收。
#[derive(Clone, Serialize, Deserialize, Debug, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DonationAmountDto {
    /// 捐赠金额，必须大于0（最小为链上最小单位）
    #[validate(range(min = 0.000000000000000001))]
    pub value: f64,
    pub currency_symbol: Option<String>,
    pub network_name: Option<String>,
    pub expected_chain_id: Option<u64>,
}

/// 客户端提交的捐赠元信息附加数据
#[derive(Clone, Serialize, Deserialize, Debug, Default, ToSchema)]
pub struct DonationMetaDto {
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
}

/// 记录捐赠的请求体（链上转账完成并确认后由客户端提交）
#[derive(Clone, Serialize, Deserialize, Debug, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDonationDto {
    /// 目标筹款请求ID（24位hex）
    #[validate(length(equal = 24))]
    pub request: String,

    /// 接收者用户ID，缺省为请求所有者
    #[validate(length(equal = 24))]
    pub to_user: Option<String>,

    /// 捐赠者钱包地址
    #[validate(length(min = 1))]
    pub from_wallet: String,

    /// 接收者钱包地址
    #[validate(length(min = 1))]
    pub to_wallet: String,

    #[validate]
    pub amount: DonationAmountDto,

    /// 链上交易哈希（全局唯一去重键）
    #[validate(length(min = 1))]
    pub tx_hash: String,

    pub block_number: Option<u64>,

    /// 链上交易时间戳（unix秒）
    pub tx_timestamp: Option<i64>,

    pub meta: Option<DonationMetaDto>,
}

/// 捐赠列表查询参数
#[derive(Clone, Serialize, Deserialize, Debug, Default, ToSchema)]
pub struct ListDonationsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub request_id: Option<String>,
    pub from_user: Option<String>,
    pub to_user: Option<String>,
    pub from_wallet: Option<String>,
    pub to_wallet: Option<String>,
    /// created_at | amount | block_number
    pub sort_by: Option<String>,
    /// asc | desc（默认desc）
    pub sort_order: Option<String>,
}

/// 账本与聚合值的对账报告
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct TotalsAudit {
    pub request_id: String,
    /// 从捐赠账本重算出的总额
    pub ledger_total: f64,
    /// 账本中的捐赠笔数
    pub ledger_count: u64,
    /// 请求文档上维护的增量聚合总额
    pub recorded_total: f64,
    pub recorded_count: u64,
    /// recorded - ledger，非0表示存在漂移
    pub total_drift: f64,
    pub count_drift: i64,
}
