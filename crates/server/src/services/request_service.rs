use crate::dtos::request_dto::CreateRequestDto;
use async_trait::async_trait;
use database::{
    request::model::{FundingRequest, RequestStatus, RequestTarget},
    user::repository::UserRepositoryTrait,
    Database,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, AppError, AppResult};

pub type DynRequestService = Arc<dyn RequestServiceTrait + Send + Sync>;

#[async_trait]
pub trait RequestServiceTrait {
    async fn create_request(&self, owner: ObjectId, dto: CreateRequestDto) -> AppResult<FundingRequest>;

    async fn get_request(&self, request_id: &str) -> AppResult<FundingRequest>;

    /// 仅请求所有者可以更新状态
    async fn set_status(&self, request_id: &str, caller: ObjectId, status: RequestStatus) -> AppResult<FundingRequest>;
}

#[derive(Clone)]
pub struct RequestService {
    database: Arc<Database>,
    config: Arc<AppConfig>,
}

impl RequestService {
    pub fn new(database: Arc<Database>, config: Arc<AppConfig>) -> Self {
        Self { database, config }
    }
}

fn parse_request_id(value: &str) -> AppResult<ObjectId> {
    value
        .parse::<ObjectId>()
        .map_err(|_| AppError::BadRequest("Invalid request id".to_string()))
}

#[async_trait]
impl RequestServiceTrait for RequestService {
    async fn create_request(&self, owner: ObjectId, dto: CreateRequestDto) -> AppResult<FundingRequest> {
        // 创建消耗一个请求额度，计数器递减是条件原子更新
        let remaining = self.database.consume_request_credit(&owner).await?;

        let target = RequestTarget {
            amount: dto.target.amount,
            currency_symbol: dto.target.currency_symbol.unwrap_or_else(|| "ETH".to_string()).to_uppercase(),
            network_name: dto
                .target
                .network_name
                .unwrap_or_else(|| self.config.default_network_name.clone())
                .to_lowercase(),
            expected_chain_id: dto.target.expected_chain_id.unwrap_or(self.config.default_chain_id),
        };

        let mut request = FundingRequest::new(
            owner,
            dto.title,
            dto.description,
            dto.category.unwrap_or_default(),
            target,
        );

        let result = self.database.request_repository.insert_request(request.clone()).await?;
        request.id = result.inserted_id.as_object_id();

        info!("📌 request created by {} ({} credits left)", owner, remaining);

        Ok(request)
    }

    async fn get_request(&self, request_id: &str) -> AppResult<FundingRequest> {
        let id = parse_request_id(request_id)?;
        self.database
            .request_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
    }

    async fn set_status(&self, request_id: &str, caller: ObjectId, status: RequestStatus) -> AppResult<FundingRequest> {
        let id = parse_request_id(request_id)?;
        let request = self
            .database
            .request_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

        if request.user != caller {
            return Err(AppError::Forbidden("Not authorized to update this request".to_string()));
        }

        self.database.request_repository.update_status(&id, status).await
    }
}

#[cfg(test)]
mod tests {
    //! 需要MongoDB连接的集成测试，手动运行:
    //! `MONGO_URI=mongodb://localhost:27017 cargo test -- --ignored`

    use super::*;
    use crate::dtos::request_dto::RequestTargetDto;
    use database::user::model::{FullName, User};
    use utils::AppConfig;

    async fn setup() -> (RequestService, Arc<Database>) {
        std::env::set_var("MONGO_DB", "test_db_request_service");
        let config = Arc::new(AppConfig::new_for_test());
        let db = Database::new(config.clone()).await.unwrap();

        db.users.drop(None).await.ok();
        db.requests.drop(None).await.ok();

        let database = Arc::new(db);
        (RequestService::new(database.clone(), config), database)
    }

    async fn create_user(database: &Database, credits: i64) -> ObjectId {
        let now = chrono::Utc::now().timestamp() as u64;
        let user = User {
            id: None,
            full_name: FullName {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
            },
            email: format!("{}@example.com", ObjectId::new().to_hex()),
            wallet_id: Some("0xaaa0000000000000000000000000000000000001".to_string()),
            requests: credits,
            boasts: 0,
            created_at: now,
            updated_at: now,
        };
        let result = database.users.insert_one(user, None).await.unwrap();
        result.inserted_id.as_object_id().unwrap()
    }

    fn create_dto() -> CreateRequestDto {
        CreateRequestDto {
            title: "Medical help".to_string(),
            description: "Need support".to_string(),
            category: None,
            target: RequestTargetDto {
                amount: 2.0,
                currency_symbol: None,
                network_name: None,
                expected_chain_id: None,
            },
        }
    }

    #[tokio::test]
    #[ignore] // 需要MongoDB连接
    async fn test_create_request_consumes_credit() {
        let (service, database) = setup().await;
        let owner = create_user(&database, 2).await;

        let request = service.create_request(owner, create_dto()).await.unwrap();
        assert_eq!(request.status, RequestStatus::Open);
        assert_eq!(request.totals.total_received, 0.0);
        assert_eq!(request.totals.donors_count, 0);

        let user = database.users.find_one(mongodb::bson::doc! { "_id": owner }, None).await.unwrap().unwrap();
        assert_eq!(user.requests, 1);
    }

    #[tokio::test]
    #[ignore] // 需要MongoDB连接
    async fn test_create_request_without_credits_fails() {
        let (service, database) = setup().await;
        let owner = create_user(&database, 0).await;

        let result = service.create_request(owner, create_dto()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    #[ignore] // 需要MongoDB连接
    async fn test_set_status_owner_only() {
        let (service, database) = setup().await;
        let owner = create_user(&database, 1).await;
        let request = service.create_request(owner, create_dto()).await.unwrap();
        let id = request.id.unwrap().to_hex();

        // 非所有者：拒绝
        let result = service.set_status(&id, ObjectId::new(), RequestStatus::Closed).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        // 所有者：允许
        let updated = service.set_status(&id, owner, RequestStatus::Closed).await.unwrap();
        assert_eq!(updated.status, RequestStatus::Closed);
    }
}
