use crate::error::{RunStage, SyncError};
use chrono::{NaiveDate, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

const MARKER_PREFIX: &str = "last_execution_";
const MARKER_SUFFIX: &str = ".flag";

/// 按日期键控的首次运行标记仓库
///
/// 每个自然日一个哨兵文件; 用 create_new 保证同一天的判定只有一次
/// 返回 true。创建当天标记时顺带清理历史标记 (尽力而为)。
#[derive(Debug, Clone)]
pub struct RunMarkerStore {
    dir: PathBuf,
}

impl RunMarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 当天首次运行返回 true (且仅此一次); 标记已存在返回 false
    pub fn first_run_today(&self, today: NaiveDate) -> Result<bool, SyncError> {
        let path = self.marker_path(today);
        let persistence = |source: io::Error| SyncError::Persistence {
            stage: RunStage::FirstRunCheck,
            path: path.clone(),
            source: Box::new(source),
        };

        fs::create_dir_all(&self.dir).map_err(|e| persistence(e))?;

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // 标记内容是创建时刻, 只用于排障
                let _ = writeln!(file, "{}", Utc::now().timestamp_millis());
                self.prune_stale(today);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(persistence(e)),
        }
    }

    fn marker_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{MARKER_PREFIX}{date}{MARKER_SUFFIX}"))
    }

    /// 清理非当天的标记; 失败仅记日志, 不影响运行
    fn prune_stale(&self, today: NaiveDate) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("无法列出标记目录 {:?}: {}", self.dir, e);
                return;
            }
        };

        let keep = format!("{MARKER_PREFIX}{today}{MARKER_SUFFIX}");
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(MARKER_PREFIX) && name.ends_with(MARKER_SUFFIX) && name != keep {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::warn!("清理历史标记 {} 失败: {}", name, e);
                }
            }
        }
    }
}
