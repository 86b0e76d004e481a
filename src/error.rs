use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 运行阶段 — 错误携带出错所在的阶段, 用于推导本次运行的终态标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    FirstRunCheck,
    IncrementalExtraction,
    Reconcile,
    FullExtraction,
    Snapshot,
    Stamping,
    Publishing,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::FirstRunCheck => "first-run-check",
            RunStage::IncrementalExtraction => "incremental-extraction",
            RunStage::Reconcile => "reconcile",
            RunStage::FullExtraction => "full-extraction",
            RunStage::Snapshot => "snapshot",
            RunStage::Stamping => "stamping",
            RunStage::Publishing => "publishing",
        };
        f.write_str(name)
    }
}

/// 同步错误分类
///
/// 预期内的情况 (增量结果为空、当天首次运行、变更文件尚不存在) 不走错误通道,
/// 它们是有既定行为的正常分支。
#[derive(Debug, Error)]
pub enum SyncError {
    /// 数据库不可达或查询失败 — collaborator 层重试耗尽后对本次运行是终态
    #[error("connectivity failure during {stage}: {source}")]
    Connectivity {
        stage: RunStage,
        #[source]
        source: sqlx::Error,
    },

    /// 本地文件写入失败 — 本次运行致命, 原子替换保证不留下半成品文件
    #[error("persistence failure during {stage} for {path:?}: {source}")]
    Persistence {
        stage: RunStage,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 远端上传在重试耗尽后仍失败 — 对运行非致命, 本地产物仍是权威记录
    #[error("publish failure for {artifact}: {reason}")]
    Publish { artifact: String, reason: String },
}

impl SyncError {
    /// 本次运行的终态标签
    pub fn terminal_label(&self) -> &'static str {
        match self {
            SyncError::Connectivity {
                stage: RunStage::FullExtraction | RunStage::Snapshot,
                ..
            } => "failed-snapshot",
            SyncError::Connectivity { .. } => "failed-extraction",
            SyncError::Persistence { .. } => "failed-persistence",
            SyncError::Publish { .. } => "failed-publish",
        }
    }
}
