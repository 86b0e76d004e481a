use crate::db::queries;
use crate::error::{RunStage, SyncError};
use crate::models::RawProductRow;
use async_trait::async_trait;
use sqlx::PgPool;

/// 数据抽取协作方
///
/// 连接管理、查询超时与"何为变更"的判定都属于实现方;
/// 协调器只消费行集。
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// 增量抽取: 回看窗口 (分钟) 内有更新的行
    async fn fetch_incremental(&self, window_minutes: i32)
        -> Result<Vec<RawProductRow>, SyncError>;

    /// 全量抽取: 当前完整数据集
    async fn fetch_full(&self) -> Result<Vec<RawProductRow>, SyncError>;
}

/// 基于 Postgres 连接池的抽取实现
pub struct PgCatalogSource {
    pool: PgPool,
}

impl PgCatalogSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for PgCatalogSource {
    async fn fetch_incremental(
        &self,
        window_minutes: i32,
    ) -> Result<Vec<RawProductRow>, SyncError> {
        queries::fetch_incremental(&self.pool, window_minutes)
            .await
            .map_err(|source| SyncError::Connectivity {
                stage: RunStage::IncrementalExtraction,
                source,
            })
    }

    async fn fetch_full(&self) -> Result<Vec<RawProductRow>, SyncError> {
        queries::fetch_full(&self.pool)
            .await
            .map_err(|source| SyncError::Connectivity {
                stage: RunStage::FullExtraction,
                source,
            })
    }
}
