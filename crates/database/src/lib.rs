////////////////////////////////////////////////////////////////////////
//
// 1. 每个Domain(Entity)单独一个文件夹
// 2. 每个Domain由两部分组成:
//    - model: 定义Schema
//    - repository: 实际的数据库底层操作
//
//////////////////////////////////////////////////////////////////////

use mongodb::{Client, Collection};
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, AppResult};

pub mod donation;
pub mod request;
pub mod user;

#[derive(Clone, Debug)]
pub struct Database {
    pub users: Collection<user::model::User>,
    pub requests: Collection<request::model::FundingRequest>,
    pub donations: Collection<donation::model::Donation>,
    // 仓库层
    pub request_repository: request::repository::RequestRepository,
    pub donation_repository: donation::repository::DonationRepository,
}

impl Database {
    pub async fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db: mongodb::Database = client.database(&config.mongo_db);

        let users = db.collection("User");
        let requests = db.collection("Request");
        let donations = db.collection("Donation");

        // 初始化仓库层
        let request_repository = request::repository::RequestRepository::new(requests.clone());
        let donation_repository = donation::repository::DonationRepository::new(donations.clone());

        info!("🧱 database({:#}) connected.", &config.mongo_db);

        Ok(Database {
            users,
            requests,
            donations,
            request_repository,
            donation_repository,
        })
    }

    /// 初始化各集合索引（含捐赠tx_hash唯一索引，启动时必须成功）
    pub async fn init_repository_indexes(&self) -> AppResult<()> {
        self.request_repository.init_indexes().await?;
        self.donation_repository.init_indexes().await?;

        info!("✅ 数据库索引初始化完成");
        Ok(())
    }
}

// Re-export specific items to avoid naming conflicts
pub use donation::model::{Donation, DonationAmount, DonationMeta, DonationQueryParams, PagedDonations, TxStatus};
pub use request::model::{FundingRequest, RequestCategory, RequestStatus, RequestTarget, RequestTotals};
pub use user::model::User;
