use crate::{user::model::User, Database};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use std::sync::Arc;
use utils::{AppError, AppResult};

pub type DynUserRepository = Arc<dyn UserRepositoryTrait + Send + Sync>;

// 主要用于Service中，表示提供了该Trait功能
#[async_trait]
pub trait UserRepositoryTrait {
    async fn get_user_by_id(&self, user_id: &ObjectId) -> AppResult<Option<User>>;

    // 更新用户注册的钱包地址（小写规范化）
    async fn update_wallet_id(&self, user_id: &ObjectId, wallet_id: &str) -> AppResult<User>;

    // 原子消耗一个请求额度，返回剩余额度
    async fn consume_request_credit(&self, user_id: &ObjectId) -> AppResult<i64>;
}

#[async_trait]
impl UserRepositoryTrait for Database {
    async fn get_user_by_id(&self, user_id: &ObjectId) -> AppResult<Option<User>> {
        let user = self.users.find_one(doc! { "_id": user_id }, None).await?;
        Ok(user)
    }

    async fn update_wallet_id(&self, user_id: &ObjectId, wallet_id: &str) -> AppResult<User> {
        let now = Utc::now().timestamp();
        let updated = self
            .users
            .find_one_and_update(
                doc! { "_id": user_id },
                doc! { "$set": { "wallet_id": wallet_id.to_lowercase(), "updated_at": now } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// 条件递减请求额度计数器
    ///
    /// 过滤条件带上 `> 0`，检查与递减是同一个原子更新，
    /// 并发创建不会把额度扣成负数。
    async fn consume_request_credit(&self, user_id: &ObjectId) -> AppResult<i64> {
        let now = Utc::now().timestamp();
        let updated = self
            .users
            .find_one_and_update(
                doc! { "_id": user_id, "requests": { "$gt": 0 } },
                doc! { "$inc": { "requests": -1 }, "$set": { "updated_at": now } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        if let Some(user) = updated {
            return Ok(user.requests);
        }

        // 区分"用户不存在"与"额度不足"
        let exists = self.users.find_one(doc! { "_id": user_id }, None).await?;
        if exists.is_some() {
            Err(AppError::BadRequest("Not enough request credits".to_string()))
        } else {
            Err(AppError::NotFound(format!("User {} not found", user_id)))
        }
    }
}
