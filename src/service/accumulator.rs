use crate::error::SyncError;
use crate::models::ProductRecord;
use crate::storage::StateStore;
use indexmap::IndexMap;

/// 变更累积器
///
/// 以 referencia 为键的当日增量集合。同键不做字段级合并,
/// 最新的整条记录覆盖旧记录。
pub struct ChangeAccumulator {
    store: StateStore,
}

impl ChangeAccumulator {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// 合并本次增量并持久化
    ///
    /// - 空增量: 正常分支, 不重置也不落盘, 返回已持久化的集合
    /// - 当天首次运行: 结果即本次增量 (按 referencia 去重), 前一日的累积丢弃
    /// - 后续运行: 读入已持久化集合, 按 referencia 覆盖叠加, 后写胜出
    pub fn reconcile(
        &self,
        new_changes: Vec<ProductRecord>,
        is_first_run_today: bool,
    ) -> Result<Vec<ProductRecord>, SyncError> {
        if new_changes.is_empty() {
            return Ok(self.store.load_changes());
        }

        let mut merged: IndexMap<String, ProductRecord> = IndexMap::new();
        if is_first_run_today {
            tracing::info!("当天首次运行: 重置变更集");
        } else {
            tracing::info!("后续运行: 累积变更");
            for record in self.store.load_changes() {
                merged.insert(record.referencia.clone(), record);
            }
        }

        for record in new_changes {
            merged.insert(record.referencia.clone(), record);
        }

        let accumulated: Vec<ProductRecord> = merged.into_values().collect();
        self.store.save_changes(&accumulated)?;
        tracing::info!("变更已保存: 共 {} 个商品", accumulated.len());
        Ok(accumulated)
    }
}
