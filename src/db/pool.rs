use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let statement_timeout = format!("{}s", config.query_timeout_secs);
    let mut connect_options = PgConnectOptions::from_str(&config.url)?
        // 目录查询数据量大, 超时由配置控制 (默认 300 秒)
        .options([("statement_timeout", statement_timeout.as_str())]);

    // 设置慢查询日志阈值为 5秒
    connect_options = connect_options.log_slow_statements(
        tracing::log::LevelFilter::Warn,
        Duration::from_secs(5),
    );

    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}

/// 连接探活 (SELECT 1)
pub async fn test_connection(pool: &PgPool) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(v) => v == 1,
        Err(e) => {
            tracing::error!("数据库探活失败: {}", e);
            false
        }
    }
}
