use super::model::{Donation, DonationQueryParams, PagedDonations};
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Collection, IndexModel,
};
use tracing::{debug, info};
use utils::{AppError, AppResult};

/// MongoDB重复键错误码（唯一索引冲突）
const DUPLICATE_KEY_ERROR_CODE: i32 = 11000;

/// 捐赠账本仓储
///
/// tx_hash唯一索引是exactly-once记录的核心：去重判断与插入是同一个
/// 原子写操作，而不是先查再插（先查再插在并发下存在竞态窗口）。
#[derive(Clone, Debug)]
pub struct DonationRepository {
    collection: Collection<Donation>,
}

impl DonationRepository {
    pub fn new(collection: Collection<Donation>) -> Self {
        Self { collection }
    }

    pub fn get_collection(&self) -> &Collection<Donation> {
        &self.collection
    }

    /// 初始化数据库索引
    pub async fn init_indexes(&self) -> AppResult<()> {
        info!("🔧 初始化Donation集合索引...");

        let indexes = vec![
            // tx_hash唯一索引（确保一笔链上交易只记录一次）
            IndexModel::builder()
                .keys(doc! { "tx_hash": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_tx_hash_unique".to_string())
                        .build(),
                )
                .build(),
            // 捐赠者钱包历史查询索引
            IndexModel::builder()
                .keys(doc! { "from_wallet": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_from_wallet_created_at".to_string()).build())
                .build(),
            // 接收者钱包历史查询索引
            IndexModel::builder()
                .keys(doc! { "to_wallet": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_to_wallet_created_at".to_string()).build())
                .build(),
            // 请求维度查询索引
            IndexModel::builder()
                .keys(doc! { "request": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_request_created_at".to_string()).build())
                .build(),
            // 捐赠者维度查询索引
            IndexModel::builder()
                .keys(doc! { "from_user": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_from_user_created_at".to_string()).build())
                .build(),
            // 时间排序索引
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(IndexOptions::builder().name("idx_created_at".to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes, None).await?;
        info!("✅ Donation索引创建成功");
        Ok(())
    }

    /// 插入捐赠记录，tx_hash冲突映射为领域层的重复捐赠错误
    ///
    /// 注意：不做存在性预查。唯一索引在插入时原子地裁决重复，
    /// 并发重试同一笔交易最多只有一次插入成功。
    pub async fn insert_donation(&self, donation: Donation) -> AppResult<Donation> {
        let mut donation = donation;
        match self.collection.insert_one(&donation, None).await {
            Ok(result) => {
                donation.id = result.inserted_id.as_object_id();
                debug!("✅ 捐赠已记录: tx_hash={}", donation.tx_hash);
                Ok(donation)
            }
            Err(e) if is_duplicate_key_error(&e) => {
                debug!("ℹ️ 捐赠已存在（重复键），拒绝: tx_hash={}", donation.tx_hash);
                Err(AppError::Conflict("Donation already recorded".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Donation>> {
        let donation = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(donation)
    }

    pub async fn find_by_tx_hash(&self, tx_hash: &str) -> AppResult<Option<Donation>> {
        let donation = self.collection.find_one(doc! { "tx_hash": tx_hash }, None).await?;
        Ok(donation)
    }

    /// 分页查询捐赠列表
    pub async fn list(&self, params: DonationQueryParams) -> AppResult<PagedDonations> {
        let params = params.normalized();
        let filter = build_list_filter(&params);
        let sort = build_list_sort(&params);

        let total = self.collection.count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(sort)
            .skip((params.page - 1) * params.limit)
            .limit(params.limit as i64)
            .build();

        let items: Vec<Donation> = self.collection.find(filter, options).await?.try_collect().await?;

        Ok(PagedDonations::new(items, total, params.page, params.limit))
    }

    /// 从账本重算某请求的聚合值（审计用，热路径不走这里）
    pub async fn aggregate_totals_for_request(&self, request_id: &ObjectId) -> AppResult<(f64, u64)> {
        let pipeline = vec![
            doc! { "$match": { "request": request_id } },
            doc! { "$group": {
                "_id": null,
                "total_received": { "$sum": "$amount.value" },
                "donations_count": { "$sum": 1 },
            }},
        ];

        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        if let Some(result) = cursor.try_next().await? {
            let total = result.get_f64("total_received").unwrap_or(0.0);
            let count = result.get_i32("donations_count").map(|c| c as u64).unwrap_or(0);
            Ok((total, count))
        } else {
            Ok((0.0, 0))
        }
    }
}

/// 判断是否为唯一索引冲突（E11000）
pub fn is_duplicate_key_error(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_ERROR_CODE,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_ERROR_CODE))
            .unwrap_or(false),
        _ => error.to_string().contains("duplicate key"),
    }
}

fn build_list_filter(params: &DonationQueryParams) -> Document {
    let mut filter = Document::new();
    if let Some(request) = params.request {
        filter.insert("request", request);
    }
    if let Some(from_user) = params.from_user {
        filter.insert("from_user", from_user);
    }
    if let Some(to_user) = params.to_user {
        filter.insert("to_user", to_user);
    }
    if let Some(from_wallet) = &params.from_wallet {
        filter.insert("from_wallet", from_wallet.to_lowercase());
    }
    if let Some(to_wallet) = &params.to_wallet {
        filter.insert("to_wallet", to_wallet.to_lowercase());
    }
    filter
}

fn build_list_sort(params: &DonationQueryParams) -> Document {
    let sort_by = match params.sort_by.as_deref() {
        Some("amount") => "amount.value",
        Some("block_number") => "block_number",
        _ => "created_at",
    };
    let order = match params.sort_order.as_deref() {
        Some("asc") => 1,
        _ => -1,
    };
    // _id作为tie-break保证分页排序稳定
    doc! { sort_by: order, "_id": order }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter_lowercases_wallets() {
        let params = DonationQueryParams {
            from_wallet: Some("0xABCDEF".to_string()),
            ..Default::default()
        };
        let filter = build_list_filter(&params);
        assert_eq!(filter.get_str("from_wallet").unwrap(), "0xabcdef");
        assert!(!filter.contains_key("to_wallet"));
        assert!(!filter.contains_key("request"));
    }

    #[test]
    fn test_list_sort_defaults_newest_first() {
        let sort = build_list_sort(&DonationQueryParams::default());
        assert_eq!(sort.get_i32("created_at").unwrap(), -1);
        assert_eq!(sort.get_i32("_id").unwrap(), -1);

        let sort = build_list_sort(&DonationQueryParams {
            sort_by: Some("amount".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        });
        assert_eq!(sort.get_i32("amount.value").unwrap(), 1);
    }

    mod integration {
        //! 需要MongoDB连接的集成测试，手动运行:
        //! `MONGO_URI=mongodb://localhost:27017 cargo test -- --ignored`

        use super::super::*;
        use crate::donation::model::{DonationAmount, DonationMeta, TxStatus};
        use mongodb::options::ClientOptions;

        async fn setup_test_db(collection_name: &str) -> Collection<Donation> {
            let mongo_uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
            let client_options = ClientOptions::parse(&mongo_uri).await.unwrap();
            let client = mongodb::Client::with_options(client_options).unwrap();
            let db = client.database("test_db_donations");
            let collection = db.collection::<Donation>(collection_name);

            // 清空测试集合并重建唯一索引
            collection.drop(None).await.ok();
            let repo = DonationRepository::new(collection.clone());
            repo.init_indexes().await.unwrap();

            collection
        }

        fn sample_donation(request: ObjectId, tx_hash: &str, value: f64) -> Donation {
            Donation {
                id: None,
                request,
                from_user: ObjectId::new(),
                to_user: ObjectId::new(),
                from_wallet: "0xaaa0000000000000000000000000000000000001".to_string(),
                to_wallet: "0xbbb0000000000000000000000000000000000002".to_string(),
                amount: DonationAmount {
                    value,
                    currency_symbol: "ETH".to_string(),
                    network_name: "sepolia".to_string(),
                    expected_chain_id: 11155111,
                },
                tx_hash: tx_hash.to_string(),
                tx_status: TxStatus::Confirmed,
                block_number: Some(100),
                tx_timestamp: None,
                meta: DonationMeta::default(),
                created_at: 0,
                updated_at: 0,
            }
            .created_now()
        }

        #[tokio::test]
        #[ignore] // 需要MongoDB连接
        async fn test_duplicate_tx_hash_rejected() {
            let collection = setup_test_db("test_duplicate_tx").await;
            let repo = DonationRepository::new(collection.clone());

            let request = ObjectId::new();
            repo.insert_donation(sample_donation(request, "0xaaa", 1.0)).await.unwrap();

            // 第二次插入相同tx_hash：应该被拒绝
            let result = repo.insert_donation(sample_donation(request, "0xaaa", 1.0)).await;
            assert!(matches!(result, Err(AppError::Conflict(_))), "重复交易应该被拒绝");

            // 验证数据库只有一条记录
            let count = collection.count_documents(doc! { "tx_hash": "0xaaa" }, None).await.unwrap();
            assert_eq!(count, 1, "应该只有一条记录");
        }

        #[tokio::test]
        #[ignore] // 需要MongoDB连接
        async fn test_concurrent_duplicate_submissions() {
            let collection = setup_test_db("test_concurrent_dup").await;
            let repo = DonationRepository::new(collection.clone());

            let request = ObjectId::new();
            let mut handles = Vec::new();
            for _ in 0..10 {
                let repo = repo.clone();
                handles.push(tokio::spawn(async move {
                    repo.insert_donation(sample_donation(request, "0xrace", 1.0)).await
                }));
            }

            let mut successes = 0;
            for handle in handles {
                if handle.await.unwrap().is_ok() {
                    successes += 1;
                }
            }
            assert_eq!(successes, 1, "并发提交同一tx_hash只能成功一次");

            let count = collection.count_documents(doc! { "tx_hash": "0xrace" }, None).await.unwrap();
            assert_eq!(count, 1);
        }

        #[tokio::test]
        #[ignore] // 需要MongoDB连接
        async fn test_list_pagination() {
            let collection = setup_test_db("test_pagination").await;
            let repo = DonationRepository::new(collection);

            let request = ObjectId::new();
            for i in 0..15 {
                repo.insert_donation(sample_donation(request, &format!("0xtx{}", i), 1.0))
                    .await
                    .unwrap();
            }

            let page1 = repo
                .list(DonationQueryParams {
                    request: Some(request),
                    page: 1,
                    limit: 10,
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(page1.items.len(), 10);
            assert_eq!(page1.total, 15);
            assert_eq!(page1.total_pages, 2);

            let page2 = repo
                .list(DonationQueryParams {
                    request: Some(request),
                    page: 2,
                    limit: 10,
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(page2.items.len(), 5);

            // 越界页返回空集而不是错误
            let page3 = repo
                .list(DonationQueryParams {
                    request: Some(request),
                    page: 3,
                    limit: 10,
                    ..Default::default()
                })
                .await
                .unwrap();
            assert!(page3.items.is_empty());
        }

        #[tokio::test]
        #[ignore] // 需要MongoDB连接
        async fn test_aggregate_totals_for_request() {
            let collection = setup_test_db("test_aggregate").await;
            let repo = DonationRepository::new(collection);

            let request = ObjectId::new();
            repo.insert_donation(sample_donation(request, "0xagg1", 1.5)).await.unwrap();
            repo.insert_donation(sample_donation(request, "0xagg2", 0.5)).await.unwrap();
            // 其他请求的捐赠不计入
            repo.insert_donation(sample_donation(ObjectId::new(), "0xagg3", 9.0))
                .await
                .unwrap();

            let (total, count) = repo.aggregate_totals_for_request(&request).await.unwrap();
            assert_eq!(total, 2.0);
            assert_eq!(count, 2);
        }
    }
}
