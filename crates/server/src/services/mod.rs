////////////////////////////////////////////////////////////////////////
//
// Service层：业务规则所在，Controller只做参数提取与响应映射，
// Repository只做数据库底层操作。
//
//////////////////////////////////////////////////////////////////////

pub mod donation_service;
pub mod request_service;
pub mod user_service;

use database::Database;
use donation_service::{DonationService, DynDonationService};
use request_service::{DynRequestService, RequestService};
use std::sync::Arc;
use tracing::info;
use user_service::{DynUserService, UserService};
use utils::AppConfig;

#[derive(Clone)]
pub struct Services {
    pub user: DynUserService,
    pub request: DynRequestService,
    pub donation: DynDonationService,
    pub database: Arc<Database>,
    pub config: Arc<AppConfig>,
}

impl Services {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        let database = Arc::new(db);

        let user = Arc::new(UserService::new(database.clone())) as DynUserService;
        let request = Arc::new(RequestService::new(database.clone(), config.clone())) as DynRequestService;
        let donation = Arc::new(DonationService::new(database.clone(), config.clone())) as DynDonationService;

        info!("🧠 Services initialized");

        Self {
            user,
            request,
            donation,
            database,
            config,
        }
    }
}
