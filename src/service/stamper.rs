use crate::models::VersionInfo;
use chrono::{DateTime, Local};

const VERSION_PREFIX: &str = "1.0";
const DATA_SOURCE: &str = "catalog_sql_database";
const SYNC_METHOD: &str = "drive_api";

/// 版本标记器
///
/// 版本号 = 固定 major.minor 前缀 + 毫秒时间戳。同一毫秒内的两次
/// 调用不保证版本唯一, 以运行节奏 (小时级) 为前提接受。
pub struct VersionStamper;

impl VersionStamper {
    pub fn new() -> Self {
        Self
    }

    /// 纯函数: 输入变更数与时钟, 输出版本信息
    pub fn stamp(&self, changes_count: usize, now: DateTime<Local>) -> VersionInfo {
        let timestamp = now.timestamp_millis();
        VersionInfo {
            version: format!("{VERSION_PREFIX}.{timestamp}"),
            timestamp,
            changes_count,
            data_source: DATA_SOURCE.to_string(),
            execution_time: now.to_rfc3339(),
            sync_method: SYNC_METHOD.to_string(),
        }
    }
}

impl Default for VersionStamper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_embeds_millisecond_timestamp() {
        let now = Local::now();
        let info = VersionStamper::new().stamp(7, now);
        assert_eq!(info.version, format!("1.0.{}", now.timestamp_millis()));
        assert_eq!(info.timestamp, now.timestamp_millis());
        assert_eq!(info.changes_count, 7);
    }

    #[test]
    fn stamp_is_deterministic_given_the_clock() {
        let now = Local::now();
        let stamper = VersionStamper::new();
        assert_eq!(stamper.stamp(3, now), stamper.stamp(3, now));
    }
}
