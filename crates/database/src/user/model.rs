use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 用户姓名
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FullName {
    pub first_name: String,
    pub last_name: String,
}

/// 用户模型
///
/// 认证与会话由上游凭证服务负责，这里只保留捐赠路径需要引用的字段：
/// 钱包地址（接收方to_wallet从这里读取）与两个额度计数器。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// MongoDB文档ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub full_name: FullName,
    /// 邮箱（唯一）
    pub email: String,
    /// 用户注册的钱包地址（小写）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    /// 剩余的请求创建额度
    pub requests: i64,
    /// 剩余的boost额度
    pub boasts: i64,
    /// 创建时间（unix秒）
    pub created_at: u64,
    /// 更新时间（unix秒）
    pub updated_at: u64,
}
