use async_trait::async_trait;
use database::{
    donation::model::normalize_hex,
    user::{model::User, repository::DynUserRepository},
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use utils::{AppError, AppResult};

pub type DynUserService = Arc<dyn UserServiceTrait + Send + Sync>;

#[async_trait]
pub trait UserServiceTrait {
    async fn get_user(&self, user_id: ObjectId) -> AppResult<User>;

    /// 绑定钱包地址（捐赠接收方to_wallet从这里读取）
    async fn update_wallet_id(&self, user_id: ObjectId, wallet_id: &str) -> AppResult<User>;
}

#[derive(Clone)]
pub struct UserService {
    repository: DynUserRepository,
}

impl UserService {
    pub fn new(repository: DynUserRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UserServiceTrait for UserService {
    async fn get_user(&self, user_id: ObjectId) -> AppResult<User> {
        self.repository
            .get_user_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    async fn update_wallet_id(&self, user_id: ObjectId, wallet_id: &str) -> AppResult<User> {
        let normalized = normalize_hex(wallet_id);
        let user = self.repository.update_wallet_id(&user_id, &normalized).await?;

        Ok(user)
    }
}
