pub mod donation_controller;
pub mod request_controller;
pub mod user_controller;

use axum::routing::{get, Router};

/// 系统健康检查
///
/// 返回服务器运行状态
///
/// # 响应
///
/// 返回简单的状态消息字符串
#[utoipa::path(
    get,
    path = "/api/v1/",
    responses(
        (status = 200, description = "服务器运行正常", body = String)
    ),
    tag = "系统状态"
)]
pub async fn health() -> &'static str {
    "Server is running! 🚀"
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/users", user_controller::UserController::app())
        .nest("/requests", request_controller::RequestController::app())
        .nest("/donations", donation_controller::DonationController::app())
}
