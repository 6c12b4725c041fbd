use crate::{
    dtos::donation_dto::{CreateDonationDto, ListDonationsQuery, TotalsAudit},
    extractors::{auth_user::AuthUser, validation_extractor::ValidationExtractor},
    services::{donation_service::DonationClaim, Services},
};
use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use database::donation::model::{Donation, DonationMeta, DonationQueryParams, PagedDonations};
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};
use utils::{AppError, AppResult};

/// 从请求头提取捐赠记录的审计元信息
fn meta_from_headers(headers: &HeaderMap, extra: Option<Value>) -> DonationMeta {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    // 反向代理之后的真实客户端IP取x-forwarded-for链的第一跳
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string());

    DonationMeta {
        user_agent,
        client_ip,
        extra,
    }
}

fn parse_optional_id(value: Option<String>, what: &str) -> AppResult<Option<ObjectId>> {
    match value {
        Some(raw) => raw
            .parse::<ObjectId>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {} id", what))),
        None => Ok(None),
    }
}

fn query_to_params(query: ListDonationsQuery) -> AppResult<DonationQueryParams> {
    Ok(DonationQueryParams {
        request: parse_optional_id(query.request_id, "request")?,
        from_user: parse_optional_id(query.from_user, "user")?,
        to_user: parse_optional_id(query.to_user, "user")?,
        from_wallet: query.from_wallet,
        to_wallet: query.to_wallet,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(10),
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    }
    .normalized())
}

/// 记录一笔已确认的链上捐赠
#[utoipa::path(
    post,
    path = "/api/v1/donations",
    tag = "donation",
    request_body = CreateDonationDto,
    responses(
        (status = 201, description = "捐赠已记录", body = Donation),
        (status = 400, description = "请求不可捐赠或参数错误"),
        (status = 401, description = "未认证"),
        (status = 404, description = "请求不存在"),
        (status = 409, description = "该交易哈希已记录过"),
        (status = 503, description = "捐赠功能已关闭")
    )
)]
pub async fn record_donation(
    Extension(services): Extension<Services>,
    AuthUser(from_user): AuthUser,
    headers: HeaderMap,
    ValidationExtractor(req): ValidationExtractor<CreateDonationDto>,
) -> AppResult<(StatusCode, Json<Donation>)> {
    let claim = DonationClaim {
        request_id: req.request,
        to_user_id: req.to_user,
        from_wallet: req.from_wallet,
        to_wallet: req.to_wallet,
        amount_value: req.amount.value,
        currency_symbol: req.amount.currency_symbol,
        network_name: req.amount.network_name,
        expected_chain_id: req.amount.expected_chain_id,
        tx_hash: req.tx_hash,
        block_number: req.block_number,
        tx_timestamp: req.tx_timestamp,
        meta: meta_from_headers(&headers, req.meta.and_then(|meta| meta.extra)),
    };

    let donation = services.donation.record_donation(from_user, claim).await?;

    Ok((StatusCode::CREATED, Json(donation)))
}

/// 捐赠前资格预检（只读，不保证提交时仍然有效）
#[utoipa::path(
    post,
    path = "/api/v1/donations/validate/{request_id}",
    tag = "donation",
    params(
        ("request_id" = String, Path, description = "筹款请求ID")
    ),
    responses(
        (status = 200, description = "请求当前可接受捐赠", body = Value),
        (status = 400, description = "请求已关闭或已达标"),
        (status = 404, description = "请求不存在"),
        (status = 503, description = "捐赠功能已关闭")
    )
)]
pub async fn validate_donation(
    Extension(services): Extension<Services>,
    Path(request_id): Path<String>,
) -> AppResult<Json<Value>> {
    services.donation.validate_donation_eligibility(&request_id).await?;

    Ok(Json(json!({ "message": "Request is open for donations", "request_id": request_id })))
}

/// 当前用户发出的捐赠（分页）
#[utoipa::path(
    get,
    path = "/api/v1/donations/my",
    tag = "donation",
    responses(
        (status = 200, description = "成功返回捐赠列表", body = PagedDonations),
        (status = 401, description = "未认证")
    )
)]
pub async fn my_donations(
    Extension(services): Extension<Services>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListDonationsQuery>,
) -> AppResult<Json<PagedDonations>> {
    let mut params = query_to_params(query)?;
    params.from_user = Some(user_id);

    let page = services.donation.list_donations(params).await?;

    Ok(Json(page))
}

/// 某个筹款请求收到的捐赠（分页）
#[utoipa::path(
    get,
    path = "/api/v1/donations/request/{request_id}",
    tag = "donation",
    params(
        ("request_id" = String, Path, description = "筹款请求ID")
    ),
    responses(
        (status = 200, description = "成功返回捐赠列表", body = PagedDonations),
        (status = 400, description = "请求ID格式错误")
    )
)]
pub async fn donations_for_request(
    Extension(services): Extension<Services>,
    Path(request_id): Path<String>,
    Query(query): Query<ListDonationsQuery>,
) -> AppResult<Json<PagedDonations>> {
    let id = request_id
        .parse::<ObjectId>()
        .map_err(|_| AppError::BadRequest("Invalid request id".to_string()))?;

    let mut params = query_to_params(query)?;
    params.request = Some(id);

    let page = services.donation.list_donations(params).await?;

    Ok(Json(page))
}

/// 对账：从捐赠账本重算聚合并与请求文档上的增量值比对
#[utoipa::path(
    get,
    path = "/api/v1/donations/audit/{request_id}",
    tag = "donation",
    params(
        ("request_id" = String, Path, description = "筹款请求ID")
    ),
    responses(
        (status = 200, description = "对账报告，drift为0表示一致", body = TotalsAudit),
        (status = 404, description = "请求不存在")
    )
)]
pub async fn audit_request_totals(
    Extension(services): Extension<Services>,
    Path(request_id): Path<String>,
) -> AppResult<Json<TotalsAudit>> {
    let audit = services.donation.audit_request_totals(&request_id).await?;

    Ok(Json(audit))
}

/// 捐赠列表（带过滤、排序与分页）
#[utoipa::path(
    get,
    path = "/api/v1/donations",
    tag = "donation",
    responses(
        (status = 200, description = "成功返回捐赠列表", body = PagedDonations)
    )
)]
pub async fn list_donations(
    Extension(services): Extension<Services>,
    Query(query): Query<ListDonationsQuery>,
) -> AppResult<Json<PagedDonations>> {
    let params = query_to_params(query)?;
    let page = services.donation.list_donations(params).await?;

    Ok(Json(page))
}

/// 按ID查询单笔捐赠
#[utoipa::path(
    get,
    path = "/api/v1/donations/{id}",
    tag = "donation",
    params(
        ("id" = String, Path, description = "捐赠记录ID")
    ),
    responses(
        (status = 200, description = "成功返回捐赠记录", body = Donation),
        (status = 404, description = "捐赠记录不存在")
    )
)]
pub async fn get_donation(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> AppResult<Json<Donation>> {
    let donation = services.donation.get_donation(&id).await?;

    Ok(Json(donation))
}

pub struct DonationController;
impl DonationController {
    pub fn app() -> Router {
        Router::new()
            .route("/", post(record_donation).get(list_donations))
            .route("/validate/:request_id", post(validate_donation))
            .route("/my", get(my_donations))
            .route("/request/:request_id", get(donations_for_request))
            .route("/audit/:request_id", get(audit_request_totals))
            .route("/:id", get(get_donation))
    }
}
