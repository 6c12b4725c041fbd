use crate::{
    dtos::user_dto::UpdateWalletDto,
    extractors::{auth_user::AuthUser, validation_extractor::ValidationExtractor},
    services::Services,
};
use axum::{
    routing::{get, put},
    Extension, Json, Router,
};
use database::user::model::User;
use utils::AppResult;

/// 当前用户信息
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "user",
    responses(
        (status = 200, description = "成功返回用户信息", body = User),
        (status = 401, description = "未认证"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn me(Extension(services): Extension<Services>, AuthUser(user_id): AuthUser) -> AppResult<Json<User>> {
    let user = services.user.get_user(user_id).await?;

    Ok(Json(user))
}

/// 绑定/更换钱包地址
#[utoipa::path(
    put,
    path = "/api/v1/users/me/wallet",
    tag = "user",
    request_body = UpdateWalletDto,
    responses(
        (status = 200, description = "钱包地址已更新", body = User),
        (status = 401, description = "未认证"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn update_wallet(
    Extension(services): Extension<Services>,
    AuthUser(user_id): AuthUser,
    ValidationExtractor(req): ValidationExtractor<UpdateWalletDto>,
) -> AppResult<Json<User>> {
    let user = services.user.update_wallet_id(user_id, &req.wallet_id).await?;

    Ok(Json(user))
}

pub struct UserController;
impl UserController {
    pub fn app() -> Router {
        Router::new().route("/me", get(me)).route("/me/wallet", put(update_wallet))
    }
}
