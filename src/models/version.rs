use serde::{Deserialize, Serialize};

/// 版本信息 (version.json) — 派生数据, 每次产生变更的运行重新生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub timestamp: i64,
    pub changes_count: usize,
    pub data_source: String,
    pub execution_time: String,
    pub sync_method: String,
}
