use catalog_sync_rust::{
    create_pool, db, AppConfig, DrivePublisher, PgCatalogSource, RunCoordinator, RunOutcome,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env();
    info!(
        "Starting catalog sync: output_dir={:?}, window={}min, folder={}",
        config.sync.output_dir, config.sync.window_minutes, config.drive.folder
    );

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    if !db::test_connection(&pool).await {
        error!("终态: failed-extraction, 数据库连接探活失败");
        std::process::exit(1);
    }

    let source = Arc::new(PgCatalogSource::new(pool));
    let publisher = Arc::new(DrivePublisher::new(config.drive.clone()));
    let coordinator = RunCoordinator::new(&config.sync, source, publisher);

    // 单次运行, 互斥由外部调度器保证
    match coordinator.run().await {
        Ok(RunOutcome::CompletedNoChanges) => {
            info!("终态: completed-no-changes");
        }
        Ok(RunOutcome::CompletedWithChanges {
            version,
            incremental,
            accumulated,
            snapshot_total,
            publish,
        }) => {
            info!("终态: completed-with-changes");
            info!("版本: {}", version.version);
            info!(
                "增量: {} 条 / 累积: {} 条 / 全量: {} 条",
                incremental, accumulated, snapshot_total
            );
            info!("发布: {}/{} 个产物成功", publish.succeeded(), publish.total());
            if !publish.all_ok() {
                warn!("部分产物未同步到远端, 本地文件为权威记录");
            }
        }
        Err(e) => {
            error!("终态: {}, 错误: {}", e.terminal_label(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
