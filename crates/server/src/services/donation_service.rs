use crate::dtos::donation_dto::TotalsAudit;
use async_trait::async_trait;
use database::{
    donation::model::{normalize_hex, Donation, DonationAmount, DonationMeta, DonationQueryParams, PagedDonations},
    request::model::RequestStatus,
    Database,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info};
use utils::{AppConfig, AppError, AppResult};

pub type DynDonationService = Arc<dyn DonationServiceTrait + Send + Sync>;

/// 客户端提交的捐赠声明（链上转账确认后的回执数据）
#[derive(Debug, Clone)]
pub struct DonationClaim {
    pub request_id: String,
    pub to_user_id: Option<String>,
    pub from_wallet: String,
    pub to_wallet: String,
    pub amount_value: f64,
    pub currency_symbol: Option<String>,
    pub network_name: Option<String>,
    pub expected_chain_id: Option<u64>,
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub tx_timestamp: Option<i64>,
    pub meta: DonationMeta,
}

#[async_trait]
pub trait DonationServiceTrait {
    /// 捐赠前的资格预检（只读，advisory）
    async fn validate_donation_eligibility(&self, request_id: &str) -> AppResult<()>;

    /// 权威写路径：记录捐赠并折算进请求汇总
    async fn record_donation(&self, from_user: ObjectId, claim: DonationClaim) -> AppResult<Donation>;

    async fn get_donation(&self, donation_id: &str) -> AppResult<Donation>;

    async fn list_donations(&self, params: DonationQueryParams) -> AppResult<PagedDonations>;

    /// 对账：从账本重算聚合并与请求文档上的增量值比对
    async fn audit_request_totals(&self, request_id: &str) -> AppResult<TotalsAudit>;
}

#[derive(Clone)]
pub struct DonationService {
    database: Arc<Database>,
    config: Arc<AppConfig>,
}

impl DonationService {
    pub fn new(database: Arc<Database>, config: Arc<AppConfig>) -> Self {
        Self { database, config }
    }

    fn ensure_donations_enabled(&self) -> AppResult<()> {
        if !self.config.enable_donations {
            return Err(AppError::ServiceUnavailable("Donations are currently disabled".to_string()));
        }
        Ok(())
    }
}

fn parse_object_id(value: &str, what: &str) -> AppResult<ObjectId> {
    value
        .parse::<ObjectId>()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} id", what)))
}

#[async_trait]
impl DonationServiceTrait for DonationService {
    /// 预检是优化而非保证：从这里返回OK到客户端真正提交捐赠之间
    /// 状态可能变化（TOCTOU窗口），权威检查由record_donation在
    /// 写入时重新执行，这里失败只是帮客户端省掉一次注定失败的
    /// 链上转账的gas。
    async fn validate_donation_eligibility(&self, request_id: &str) -> AppResult<()> {
        self.ensure_donations_enabled()?;

        let id = parse_object_id(request_id, "request")?;
        let request = self
            .database
            .request_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

        if request.status != RequestStatus::Open {
            return Err(AppError::BadRequest("Request is not open for donations".to_string()));
        }

        if request.target_reached() {
            return Err(AppError::BadRequest(
                "Request has already reached its target amount".to_string(),
            ));
        }

        Ok(())
    }

    async fn record_donation(&self, from_user: ObjectId, claim: DonationClaim) -> AppResult<Donation> {
        self.ensure_donations_enabled()?;

        // 1. 规范化去重键与地址
        let tx_hash = normalize_hex(&claim.tx_hash);
        let from_wallet = normalize_hex(&claim.from_wallet);
        let to_wallet = normalize_hex(&claim.to_wallet);

        // 2. 加载请求
        let request_id = parse_object_id(&claim.request_id, "request")?;
        let request = self
            .database
            .request_repository
            .find_by_id(&request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

        // 3. 权威资格检查（预检只是优化，这里才是真正的门）
        if request.status != RequestStatus::Open {
            return Err(AppError::BadRequest("Request is not open for donations".to_string()));
        }

        // 4. 接收者必须是请求所有者，防止记到错误的接收人名下
        let to_user = match &claim.to_user_id {
            Some(claimed) => {
                let claimed = parse_object_id(claimed, "user")?;
                if claimed != request.user {
                    return Err(AppError::BadRequest("Target user does not own this request".to_string()));
                }
                claimed
            }
            None => request.user,
        };

        // 5. 金额与网络校验
        if claim.amount_value <= 0.0 {
            return Err(AppError::BadRequest("Donation amount must be greater than zero".to_string()));
        }

        let network_name = claim
            .network_name
            .unwrap_or_else(|| self.config.default_network_name.clone())
            .to_lowercase();
        let expected_chain_id = claim.expected_chain_id.unwrap_or(self.config.default_chain_id);
        if !network_name.eq_ignore_ascii_case(&request.target.network_name)
            || expected_chain_id != request.target.expected_chain_id
        {
            return Err(AppError::BadRequest(
                "Donation network does not match the request target".to_string(),
            ));
        }

        // 6. 插入账本。唯一索引在插入时原子裁决重复，不做先查再插。
        let donation = Donation {
            id: None,
            request: request_id,
            from_user,
            to_user,
            from_wallet,
            to_wallet,
            amount: DonationAmount {
                value: claim.amount_value,
                currency_symbol: claim.currency_symbol.unwrap_or_else(|| "ETH".to_string()).to_uppercase(),
                network_name,
                expected_chain_id,
            },
            tx_hash,
            tx_status: database::donation::model::TxStatus::Confirmed,
            block_number: claim.block_number,
            tx_timestamp: claim.tx_timestamp,
            meta: claim.meta,
            created_at: 0,
            updated_at: 0,
        }
        .created_now();

        let donation = self.database.donation_repository.insert_donation(donation).await?;

        // 7. 插入成功后才折算汇总。顺序固定为先账本后聚合：
        //    这一步失败时账本已有记录（少计，可由对账补齐），
        //    重试会在上面的唯一索引处被挡下，不会出现重复计入。
        match self
            .database
            .request_repository
            .apply_donation_and_maybe_close(&request_id, donation.amount.value)
            .await
        {
            Ok(updated) => {
                if updated.status == RequestStatus::Closed && request.status == RequestStatus::Open {
                    info!(
                        "🎯 request {} reached its target ({}) and was closed",
                        request_id, updated.totals.total_received
                    );
                }
            }
            Err(e) => {
                // 账本为准，漂移留给audit_request_totals对账发现
                error!(
                    "🔴 donation {} recorded but totals update failed for request {}: {}",
                    donation.tx_hash, request_id, e
                );
            }
        }

        Ok(donation)
    }

    async fn get_donation(&self, donation_id: &str) -> AppResult<Donation> {
        let id = parse_object_id(donation_id, "donation")?;
        self.database
            .donation_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Donation not found".to_string()))
    }

    async fn list_donations(&self, params: DonationQueryParams) -> AppResult<PagedDonations> {
        self.database.donation_repository.list(params).await
    }

    async fn audit_request_totals(&self, request_id: &str) -> AppResult<TotalsAudit> {
        let id = parse_object_id(request_id, "request")?;
        let request = self
            .database
            .request_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

        let (ledger_total, ledger_count) = self.database.donation_repository.aggregate_totals_for_request(&id).await?;

        Ok(TotalsAudit {
            request_id: id.to_hex(),
            ledger_total,
            ledger_count,
            recorded_total: request.totals.total_received,
            recorded_count: request.totals.donors_count,
            total_drift: request.totals.total_received - ledger_total,
            count_drift: request.totals.donors_count as i64 - ledger_count as i64,
        })
    }
}
