use super::model::{FundingRequest, RequestStatus};
use chrono::Utc;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    results::InsertOneResult,
    Collection, IndexModel,
};
use tracing::info;
use utils::{AppError, AppResult};

/// 筹款请求仓储
#[derive(Clone, Debug)]
pub struct RequestRepository {
    collection: Collection<FundingRequest>,
}

impl RequestRepository {
    pub fn new(collection: Collection<FundingRequest>) -> Self {
        Self { collection }
    }

    pub fn get_collection(&self) -> &Collection<FundingRequest> {
        &self.collection
    }

    /// 初始化数据库索引
    pub async fn init_indexes(&self) -> AppResult<()> {
        info!("🔧 初始化Request集合索引...");

        let indexes = vec![
            // 状态+创建时间（列表常用组合查询）
            IndexModel::builder()
                .keys(doc! { "status": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_status_created_at".to_string()).build())
                .build(),
            // 所有者查询索引
            IndexModel::builder()
                .keys(doc! { "user": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_user_created_at".to_string()).build())
                .build(),
            // 已筹金额排序索引
            IndexModel::builder()
                .keys(doc! { "totals.total_received": -1 })
                .options(IndexOptions::builder().name("idx_total_received".to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes, None).await?;
        info!("✅ Request索引创建成功");
        Ok(())
    }

    pub async fn insert_request(&self, request: FundingRequest) -> AppResult<InsertOneResult> {
        let result = self.collection.insert_one(request, None).await?;
        Ok(result)
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<FundingRequest>> {
        let request = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(request)
    }

    /// 更新请求状态（调用方负责所有权检查）
    pub async fn update_status(&self, id: &ObjectId, status: RequestStatus) -> AppResult<FundingRequest> {
        let now = Utc::now().timestamp();
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str(), "updated_at": now } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    /// 将一笔已记录的捐赠折算进请求汇总，并在达标时同步关闭请求
    ///
    /// 整个读-改-写由MongoDB聚合管道在单文档更新内完成：
    /// - `$add` 累加 total_received / donors_count（无丢失更新）
    /// - 达标判断在同一管道的第二阶段执行，看到的是累加后的值，
    ///   不存在两笔捐赠都读到"未达标"而漏关的窗口
    pub async fn apply_donation_and_maybe_close(&self, id: &ObjectId, amount_value: f64) -> AppResult<FundingRequest> {
        let now = Utc::now().timestamp();
        let pipeline = build_apply_donation_pipeline(amount_value, now);

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                pipeline,
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }
}

/// 构造聚合管道：累加汇总并在同一原子更新内判定自动关闭
pub fn build_apply_donation_pipeline(amount_value: f64, now: i64) -> Vec<Document> {
    vec![
        doc! {
            "$set": {
                "totals.total_received": { "$add": ["$totals.total_received", amount_value] },
                "totals.donors_count": { "$add": ["$totals.donors_count", 1] },
                "totals.last_donation_at": now,
                "updated_at": now,
            }
        },
        // 第二阶段看到的是第一阶段累加后的totals
        doc! {
            "$set": {
                "status": {
                    "$cond": [
                        {
                            "$and": [
                                { "$eq": ["$status", "open"] },
                                { "$gt": ["$target.amount", 0.0] },
                                { "$gte": ["$totals.total_received", "$target.amount"] },
                            ]
                        },
                        "closed",
                        "$status",
                    ]
                },
            }
        },
    ]
}
