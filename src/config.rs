use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub drive: DriveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// 大查询超时 (秒)
    pub query_timeout_secs: u64,
}

/// 同步过程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 本地产物输出目录
    pub output_dir: PathBuf,
    /// 增量查询回看窗口 (分钟)
    pub window_minutes: i32,
}

/// 远端对象存储配置 (Drive 风格 API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    pub api_base: String,
    pub upload_base: String,
    /// Bearer token (凭证管理在本系统范围之外, 按不透明输入处理)
    pub token: String,
    /// 产物所在的远端目录名
    pub folder: String,
    pub max_retries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/catalog".to_string()),
                query_timeout_secs: 300,
            },
            sync: SyncConfig {
                output_dir: PathBuf::from("output"),
                window_minutes: 65,
            },
            drive: DriveConfig {
                api_base: "https://www.googleapis.com/drive/v3".to_string(),
                upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
                token: String::new(),
                folder: "ARTICULOS JSON".to_string(),
                max_retries: 3,
            },
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                query_timeout_secs: std::env::var("QUERY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.query_timeout_secs),
            },
            sync: SyncConfig {
                output_dir: std::env::var("OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.sync.output_dir),
                window_minutes: std::env::var("WINDOW_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.sync.window_minutes),
            },
            drive: DriveConfig {
                api_base: std::env::var("DRIVE_API_BASE").unwrap_or(defaults.drive.api_base),
                upload_base: std::env::var("DRIVE_UPLOAD_BASE").unwrap_or(defaults.drive.upload_base),
                token: std::env::var("DRIVE_TOKEN").unwrap_or(defaults.drive.token),
                folder: std::env::var("DRIVE_FOLDER").unwrap_or(defaults.drive.folder),
                max_retries: std::env::var("DRIVE_MAX_RETRIES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.drive.max_retries),
            },
        }
    }
}
