use crate::error::{RunStage, SyncError};
use crate::models::{ProductRecord, VersionInfo};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const CHANGES_FILE: &str = "changes_articles.json";
pub const FULL_FILE: &str = "last_full_data.json";
pub const VERSION_FILE: &str = "version.json";

/// 本地产物仓库
///
/// 三个 JSON 文件 (变更集 / 全量快照 / 版本信息), 写入一律走
/// temp + rename 原子替换: 进程在写与改名之间崩溃时, 落盘文件
/// 要么是旧的完整内容, 要么是新的完整内容。
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 读取已累积的变更集 — 文件缺失或损坏按空集处理, 不是错误
    pub fn load_changes(&self) -> Vec<ProductRecord> {
        let path = self.dir.join(CHANGES_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        if content.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("变更文件损坏, 按空集处理: {}", e);
                Vec::new()
            }
        }
    }

    pub fn save_changes(&self, records: &[ProductRecord]) -> Result<(), SyncError> {
        self.write_json_atomic(CHANGES_FILE, records, RunStage::Reconcile)
    }

    pub fn save_snapshot(&self, records: &[ProductRecord]) -> Result<(), SyncError> {
        self.write_json_atomic(FULL_FILE, records, RunStage::Snapshot)
    }

    pub fn save_version(&self, info: &VersionInfo) -> Result<(), SyncError> {
        self.write_json_atomic(VERSION_FILE, info, RunStage::Stamping)
    }

    fn write_json_atomic<T: Serialize + ?Sized>(
        &self,
        filename: &str,
        value: &T,
        stage: RunStage,
    ) -> Result<(), SyncError> {
        let target = self.dir.join(filename);
        let persistence = |source: Box<dyn std::error::Error + Send + Sync>| {
            SyncError::Persistence {
                stage,
                path: target.clone(),
                source,
            }
        };

        fs::create_dir_all(&self.dir).map_err(|e| persistence(Box::new(e)))?;

        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| persistence(Box::new(e)))?;
        // serde_json 默认不转义非 ASCII 文本, 产物保持人类可读
        serde_json::to_writer_pretty(&mut tmp, value).map_err(|e| persistence(Box::new(e)))?;
        tmp.as_file_mut()
            .sync_all()
            .map_err(|e| persistence(Box::new(e)))?;
        tmp.persist(&target)
            .map_err(|e| persistence(Box::new(e.error)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn record(referencia: &str) -> ProductRecord {
        ProductRecord {
            referencia: referencia.to_string(),
            referencia_proveedor: "PROV-1".to_string(),
            descripcion: "Tornillería común".to_string(),
            cantidad_bulto: 1,
            unidad_venta: BigDecimal::from(1),
            familia: "FERRETERIA".to_string(),
            stock_actual: BigDecimal::from(0),
            precio_actual: BigDecimal::from(0),
            descuento: "0000".to_string(),
            localizacion: "SU".to_string(),
            estado: "A".to_string(),
            ultima_actualizacion: 0,
        }
    }

    #[test]
    fn missing_changes_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load_changes().is_empty());
    }

    #[test]
    fn corrupt_changes_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CHANGES_FILE), "{not json").unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load_changes().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save_changes(&[record("A1"), record("B2")]).unwrap();
        let loaded = store.load_changes();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].referencia, "A1");
    }

    #[test]
    fn save_replaces_previous_content_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save_changes(&[record("A1"), record("B2")]).unwrap();
        store.save_changes(&[record("C3")]).unwrap();
        let loaded = store.load_changes();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].referencia, "C3");
    }

    #[test]
    fn non_ascii_text_is_written_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save_changes(&[record("A1")]).unwrap();
        let raw = std::fs::read_to_string(dir.path().join(CHANGES_FILE)).unwrap();
        assert!(raw.contains("Tornillería"));
        assert!(!raw.contains("\\u00ed"));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save_changes(&[record("A1")]).unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![CHANGES_FILE.to_string()]);
    }
}
