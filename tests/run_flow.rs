use async_trait::async_trait;
use bigdecimal::BigDecimal;
use catalog_sync_rust::config::SyncConfig;
use catalog_sync_rust::models::{ProductRecord, RawProductRow};
use catalog_sync_rust::{
    ArtifactPublisher, CatalogSource, RunCoordinator, RunOutcome, RunStage, SyncError,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 预编排的抽取源: 每次增量调用弹出一批; 全量固定或强制失败
struct ScriptedSource {
    incremental: Mutex<VecDeque<Vec<RawProductRow>>>,
    full: Vec<RawProductRow>,
    fail_full: bool,
}

impl ScriptedSource {
    fn new(batches: Vec<Vec<RawProductRow>>, full: Vec<RawProductRow>) -> Self {
        Self {
            incremental: Mutex::new(batches.into()),
            full,
            fail_full: false,
        }
    }

    fn failing_full(batches: Vec<Vec<RawProductRow>>) -> Self {
        Self {
            incremental: Mutex::new(batches.into()),
            full: Vec::new(),
            fail_full: true,
        }
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_incremental(
        &self,
        _window_minutes: i32,
    ) -> Result<Vec<RawProductRow>, SyncError> {
        Ok(self
            .incremental
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn fetch_full(&self) -> Result<Vec<RawProductRow>, SyncError> {
        if self.fail_full {
            return Err(SyncError::Connectivity {
                stage: RunStage::FullExtraction,
                source: sqlx::Error::PoolTimedOut,
            });
        }
        Ok(self.full.clone())
    }
}

struct RecordingPublisher {
    calls: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl RecordingPublisher {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn published_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactPublisher for RecordingPublisher {
    async fn publish(&self, filename: &str, payload: &Value) -> Result<(), SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push((filename.to_string(), payload.clone()));
        if self.fail {
            return Err(SyncError::Publish {
                artifact: filename.to_string(),
                reason: "remote unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn raw(referencia: &str, precio: i64) -> RawProductRow {
    RawProductRow {
        referencia: Some(referencia.to_string()),
        precio_actual: Some(BigDecimal::from(precio)),
        ..RawProductRow::default()
    }
}

fn sync_config(dir: &Path) -> SyncConfig {
    SyncConfig {
        output_dir: dir.to_path_buf(),
        window_minutes: 65,
    }
}

fn load_changes(dir: &Path) -> Vec<ProductRecord> {
    let content = std::fs::read_to_string(dir.join("changes_articles.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn price_of<'a>(records: &'a [ProductRecord], referencia: &str) -> &'a BigDecimal {
    &records
        .iter()
        .find(|r| r.referencia == referencia)
        .unwrap()
        .precio_actual
}

/// 模拟跨日: 清掉当天的运行标记, 下一次运行即视为新一天的首次
fn clear_markers(dir: &Path) {
    for entry in std::fs::read_dir(dir).unwrap().flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("last_execution_") {
            std::fs::remove_file(entry.path()).unwrap();
        }
    }
}

#[tokio::test]
async fn two_day_accumulation_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::new(
        vec![
            vec![raw("A1", 10)],
            vec![raw("A1", 12), raw("B2", 5)],
            vec![raw("C3", 1)],
        ],
        vec![raw("A1", 10), raw("B2", 5), raw("C3", 1)],
    ));
    let publisher = Arc::new(RecordingPublisher::new());
    let coordinator = RunCoordinator::new(&sync_config(dir.path()), source, publisher.clone());

    // 第一天第一次运行
    let outcome = coordinator.run().await.unwrap();
    match outcome {
        RunOutcome::CompletedWithChanges {
            accumulated,
            publish,
            ..
        } => {
            assert_eq!(accumulated, 1);
            assert!(publish.all_ok());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    let changes = load_changes(dir.path());
    assert_eq!(changes.len(), 1);
    assert_eq!(*price_of(&changes, "A1"), BigDecimal::from(10));

    // 第一天第二次运行: 覆盖 A1, 追加 B2
    coordinator.run().await.unwrap();
    let changes = load_changes(dir.path());
    assert_eq!(changes.len(), 2);
    assert_eq!(*price_of(&changes, "A1"), BigDecimal::from(12));
    assert_eq!(*price_of(&changes, "B2"), BigDecimal::from(5));

    // 第二天第一次运行: 累积重置, 只剩 C3
    clear_markers(dir.path());
    coordinator.run().await.unwrap();
    let changes = load_changes(dir.path());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].referencia, "C3");

    // 每次有变更的运行发布三个产物
    let names = publisher.published_names();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&"changes_articles.json".to_string()));
    assert!(names.contains(&"last_full_data.json".to_string()));
    assert!(names.contains(&"version.json".to_string()));
}

#[tokio::test]
async fn empty_incremental_result_is_terminal_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::new(vec![vec![]], vec![raw("A1", 10)]));
    let publisher = Arc::new(RecordingPublisher::new());
    let coordinator = RunCoordinator::new(&sync_config(dir.path()), source, publisher.clone());

    let outcome = coordinator.run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::CompletedNoChanges));

    assert!(!dir.path().join("changes_articles.json").exists());
    assert!(!dir.path().join("last_full_data.json").exists());
    assert!(!dir.path().join("version.json").exists());
    assert!(publisher.published_names().is_empty());
}

#[tokio::test]
async fn snapshot_failure_leaves_changes_persisted_and_snapshot_untouched() {
    let dir = tempfile::tempdir().unwrap();
    // 预置上一次的快照, 失败后必须原样保留
    std::fs::write(dir.path().join("last_full_data.json"), "[\"previous\"]").unwrap();

    let source = Arc::new(ScriptedSource::failing_full(vec![vec![raw("A1", 10)]]));
    let publisher = Arc::new(RecordingPublisher::new());
    let coordinator = RunCoordinator::new(&sync_config(dir.path()), source, publisher.clone());

    let err = coordinator.run().await.unwrap_err();
    assert_eq!(err.terminal_label(), "failed-snapshot");

    // 变更集已持久化, 不回滚 (接受的不一致窗口)
    let changes = load_changes(dir.path());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].referencia, "A1");

    let snapshot = std::fs::read_to_string(dir.path().join("last_full_data.json")).unwrap();
    assert_eq!(snapshot, "[\"previous\"]");
    assert!(publisher.published_names().is_empty());
}

#[tokio::test]
async fn publish_failure_is_degraded_but_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::new(
        vec![vec![raw("A1", 10)]],
        vec![raw("A1", 10)],
    ));
    let publisher = Arc::new(RecordingPublisher::failing());
    let coordinator = RunCoordinator::new(&sync_config(dir.path()), source, publisher.clone());

    let outcome = coordinator.run().await.unwrap();
    match outcome {
        RunOutcome::CompletedWithChanges { publish, .. } => {
            assert_eq!(publish.total(), 3);
            assert_eq!(publish.succeeded(), 0);
            assert!(!publish.all_ok());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // 本地产物仍然是权威记录
    assert!(dir.path().join("changes_articles.json").exists());
    assert!(dir.path().join("last_full_data.json").exists());
    assert!(dir.path().join("version.json").exists());
}

#[tokio::test]
async fn version_counts_accumulated_changes() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::new(
        vec![vec![raw("A1", 10), raw("B2", 5)]],
        vec![raw("A1", 10), raw("B2", 5)],
    ));
    let publisher = Arc::new(RecordingPublisher::new());
    let coordinator = RunCoordinator::new(&sync_config(dir.path()), source, publisher.clone());

    match coordinator.run().await.unwrap() {
        RunOutcome::CompletedWithChanges { version, .. } => {
            assert_eq!(version.changes_count, 2);
            assert!(version.version.starts_with("1.0."));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let version: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("version.json")).unwrap())
            .unwrap();
    assert_eq!(version["changes_count"], 2);
    assert_eq!(version["sync_method"], "drive_api");
}
