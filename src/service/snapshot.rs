use crate::db::CatalogSource;
use crate::error::SyncError;
use crate::models::ProductRecord;
use crate::service::normalizer::normalize_rows;
use std::sync::Arc;

/// 快照构建器
///
/// 全量抽取 + 规范化 + 打当次运行时间戳。快照与变更集生命周期独立:
/// 永远重查全量数据, 不从累积变更推导。抽取失败直接返回错误,
/// 不产出半成品, 调用方必须保持旧快照不动。
pub struct SnapshotBuilder {
    source: Arc<dyn CatalogSource>,
}

impl SnapshotBuilder {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    pub async fn build(&self, timestamp_ms: i64) -> Result<Vec<ProductRecord>, SyncError> {
        let rows = self.source.fetch_full().await?;
        Ok(normalize_rows(rows, timestamp_ms))
    }
}
