use crate::config::SyncConfig;
use crate::db::CatalogSource;
use crate::error::SyncError;
use crate::models::{ProductRecord, VersionInfo};
use crate::publish::ArtifactPublisher;
use crate::service::accumulator::ChangeAccumulator;
use crate::service::normalizer::normalize_rows;
use crate::service::snapshot::SnapshotBuilder;
use crate::service::stamper::VersionStamper;
use crate::storage::{RunMarkerStore, StateStore, CHANGES_FILE, FULL_FILE, VERSION_FILE};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;

/// 发布结果汇总 — 逐产物成功/失败, 远端失败从不回滚本地状态
#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
    pub results: Vec<(String, bool)>,
}

impl PublishSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, ok)| *ok).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_ok(&self) -> bool {
        self.succeeded() == self.total()
    }
}

/// 运行终态; 失败终态经由 SyncError::terminal_label 表达
#[derive(Debug)]
pub enum RunOutcome {
    /// 增量结果为空: 不改动任何本地状态, 不发布
    CompletedNoChanges,
    /// 有变更: 本地产物已全部持久化
    CompletedWithChanges {
        version: VersionInfo,
        incremental: usize,
        accumulated: usize,
        snapshot_total: usize,
        publish: PublishSummary,
    },
}

/// 运行协调器
///
/// 顺序执行: 首次运行判定 → 增量抽取 → 合并持久化 → 全量快照 →
/// 版本信息 → 发布。单线程单运行, 互斥由外部调度器保证。
pub struct RunCoordinator {
    source: Arc<dyn CatalogSource>,
    publisher: Arc<dyn ArtifactPublisher>,
    store: StateStore,
    markers: RunMarkerStore,
    accumulator: ChangeAccumulator,
    snapshot: SnapshotBuilder,
    stamper: VersionStamper,
    window_minutes: i32,
}

impl RunCoordinator {
    pub fn new(
        config: &SyncConfig,
        source: Arc<dyn CatalogSource>,
        publisher: Arc<dyn ArtifactPublisher>,
    ) -> Self {
        let store = StateStore::new(&config.output_dir);
        Self {
            accumulator: ChangeAccumulator::new(store.clone()),
            snapshot: SnapshotBuilder::new(source.clone()),
            markers: RunMarkerStore::new(&config.output_dir),
            stamper: VersionStamper::new(),
            store,
            source,
            publisher,
            window_minutes: config.window_minutes,
        }
    }

    /// 执行一次完整运行
    pub async fn run(&self) -> Result<RunOutcome, SyncError> {
        let started = Local::now();
        let timestamp_ms = started.timestamp_millis();

        // 1. 当天首次运行判定 (标记存在 => 非首次; 不存在 => 创建并清理历史标记)
        let is_first_run = self.markers.first_run_today(started.date_naive())?;
        tracing::info!("当天首次运行?: {}", is_first_run);

        // 2. 增量抽取 + 规范化
        let rows = self.source.fetch_incremental(self.window_minutes).await?;
        let incremental = normalize_rows(rows, timestamp_ms);

        // 3. 无变更: 终态, 不动本地状态 (非首次运行的无变更不触发重置)
        if incremental.is_empty() {
            tracing::info!("回看窗口内无变更, 本次运行结束");
            return Ok(RunOutcome::CompletedNoChanges);
        }
        let incremental_count = incremental.len();
        tracing::info!("获取到 {} 条增量记录", incremental_count);

        // 4. 合并并持久化变更集
        let accumulated = self.accumulator.reconcile(incremental, is_first_run)?;

        // 5. 全量快照 — 失败即终止; 变更集的写入不回滚 (接受的不一致窗口)
        let snapshot = self.snapshot.build(timestamp_ms).await?;
        self.store.save_snapshot(&snapshot)?;
        tracing::info!("全量快照已更新: {} 条记录", snapshot.len());

        // 6. 版本信息
        let version = self.stamper.stamp(accumulated.len(), started);
        self.store.save_version(&version)?;
        tracing::info!("版本生成: {}", version.version);

        // 7. 发布 — 逐产物, 失败非致命
        let publish = self
            .publish_artifacts(&accumulated, &snapshot, &version)
            .await;
        tracing::info!(
            "发布结果: {}/{} 个产物上传成功",
            publish.succeeded(),
            publish.total()
        );
        if !publish.all_ok() {
            tracing::warn!("部分产物未同步到远端, 本地文件为权威记录");
        }

        Ok(RunOutcome::CompletedWithChanges {
            version,
            incremental: incremental_count,
            accumulated: accumulated.len(),
            snapshot_total: snapshot.len(),
            publish,
        })
    }

    async fn publish_artifacts(
        &self,
        accumulated: &[ProductRecord],
        snapshot: &[ProductRecord],
        version: &VersionInfo,
    ) -> PublishSummary {
        let payloads = [
            (CHANGES_FILE, serde_json::to_value(accumulated)),
            (FULL_FILE, serde_json::to_value(snapshot)),
            (VERSION_FILE, serde_json::to_value(version)),
        ];

        let mut results = Vec::with_capacity(payloads.len());
        for (name, payload) in payloads {
            let payload = match payload {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!("✗ {} 序列化失败: {}", name, e);
                    results.push((name.to_string(), false));
                    continue;
                }
            };
            match self.publisher.publish(name, &payload).await {
                Ok(()) => {
                    tracing::info!("✓ {} 上传成功", name);
                    results.push((name.to_string(), true));
                }
                Err(e) => {
                    tracing::error!("✗ {} 上传失败: {}", name, e);
                    results.push((name.to_string(), false));
                }
            }
        }
        PublishSummary { results }
    }
}
