use crate::{
    dtos::request_dto::{CreateRequestDto, UpdateRequestStatusDto},
    extractors::{auth_user::AuthUser, validation_extractor::ValidationExtractor},
    services::Services,
};
use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use database::request::model::FundingRequest;
use utils::AppResult;

/// 创建筹款请求（消耗一个请求额度）
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "request",
    request_body = CreateRequestDto,
    responses(
        (status = 201, description = "请求已创建", body = FundingRequest),
        (status = 400, description = "额度不足或参数错误"),
        (status = 401, description = "未认证"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn create_request(
    Extension(services): Extension<Services>,
    AuthUser(owner): AuthUser,
    ValidationExtractor(req): ValidationExtractor<CreateRequestDto>,
) -> AppResult<(StatusCode, Json<FundingRequest>)> {
    let request = services.request.create_request(owner, req).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// 按ID查询筹款请求
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "request",
    params(
        ("id" = String, Path, description = "筹款请求ID")
    ),
    responses(
        (status = 200, description = "成功返回筹款请求", body = FundingRequest),
        (status = 404, description = "请求不存在")
    )
)]
pub async fn get_request(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> AppResult<Json<FundingRequest>> {
    let request = services.request.get_request(&id).await?;

    Ok(Json(request))
}

/// 更新请求状态（仅请求所有者）
#[utoipa::path(
    patch,
    path = "/api/v1/requests/{id}",
    tag = "request",
    params(
        ("id" = String, Path, description = "筹款请求ID")
    ),
    request_body = UpdateRequestStatusDto,
    responses(
        (status = 200, description = "状态已更新", body = FundingRequest),
        (status = 401, description = "未认证"),
        (status = 403, description = "非请求所有者"),
        (status = 404, description = "请求不存在")
    )
)]
pub async fn update_request_status(
    Extension(services): Extension<Services>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ValidationExtractor(req): ValidationExtractor<UpdateRequestStatusDto>,
) -> AppResult<Json<FundingRequest>> {
    let request = services.request.set_status(&id, caller, req.status).await?;

    Ok(Json(request))
}

pub struct RequestController;
impl RequestController {
    pub fn app() -> Router {
        Router::new()
            .route("/", post(create_request))
            .route("/:id", get(get_request).patch(update_request_status))
    }
}
