use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HopeBridge Donation Backend API",
        description = "基于 Rust 和 Axum 的点对点加密货币捐赠平台 API 文档",
        version = "1.0.0",
        contact(
            name = "API Support",
            email = "support@hopebridge.xyz"
        )
    ),
    paths(
        // System health check
        crate::api::health,
        // Donation endpoints
        crate::api::donation_controller::record_donation,
        crate::api::donation_controller::validate_donation,
        crate::api::donation_controller::my_donations,
        crate::api::donation_controller::donations_for_request,
        crate::api::donation_controller::audit_request_totals,
        crate::api::donation_controller::list_donations,
        crate::api::donation_controller::get_donation,
        // Request endpoints
        crate::api::request_controller::create_request,
        crate::api::request_controller::get_request,
        crate::api::request_controller::update_request_status,
        // User endpoints
        crate::api::user_controller::me,
        crate::api::user_controller::update_wallet,
    ),
    components(
        schemas(
            // Database models
            database::donation::model::Donation,
            database::donation::model::DonationAmount,
            database::donation::model::DonationMeta,
            database::donation::model::TxStatus,
            database::donation::model::PagedDonations,
            database::request::model::FundingRequest,
            database::request::model::RequestTarget,
            database::request::model::RequestTotals,
            database::request::model::RequestStatus,
            database::request::model::RequestCategory,
            database::user::model::User,
            database::user::model::FullName,
            // DTOs
            crate::dtos::donation_dto::CreateDonationDto,
            crate::dtos::donation_dto::DonationAmountDto,
            crate::dtos::donation_dto::DonationMetaDto,
            crate::dtos::donation_dto::ListDonationsQuery,
            crate::dtos::donation_dto::TotalsAudit,
            crate::dtos::request_dto::CreateRequestDto,
            crate::dtos::request_dto::RequestTargetDto,
            crate::dtos::request_dto::UpdateRequestStatusDto,
            crate::dtos::user_dto::UpdateWalletDto,
        )
    ),
    tags(
        (name = "系统状态", description = "系统健康检查和状态监控"),
        (name = "donation", description = "捐赠记录与对账"),
        (name = "request", description = "筹款请求管理"),
        (name = "user", description = "用户管理")
    )
)]
pub struct ApiDoc;
