use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// 绑定/更换钱包地址的请求体
#[derive(Clone, Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct UpdateWalletDto {
    #[validate(length(min = 1))]
    pub wallet_id: String,
}
