// ==========================================
// 木材理货台账系统 - 对账批处理入口
// ==========================================
// 用法: lumber-tally-recon [db_path]
//   db_path 缺省时读环境变量 LUMBER_TALLY_DB,再缺省用 lumber_tally.db
// ==========================================

use anyhow::{anyhow, Context};
use lumber_tally::config::ConfigManager;
use lumber_tally::engine::{ReconcileOrchestrator, RunContext};
use lumber_tally::notify::LogAlertSink;
use lumber_tally::repository::{AllocationRepository, LotRepository, ReconReportRepository};
use lumber_tally::{db, logging};
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 台账对账批处理", lumber_tally::APP_NAME);
    tracing::info!("系统版本: {}", lumber_tally::VERSION);
    tracing::info!("==================================================");

    // 数据库路径: 命令行参数 > 环境变量 > 默认
    let db_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LUMBER_TALLY_DB").ok())
        .unwrap_or_else(|| "lumber_tally.db".to_string());
    tracing::info!("使用数据库: {}", db_path);

    // 打开连接并保证 schema 就绪（幂等）
    let conn = db::open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    db::init_schema(&conn).context("台账 schema 初始化失败")?;

    // schema 版本只提示不迁移,避免静默在不兼容库上运行
    match db::read_schema_version(&conn).context("schema 版本读取失败")? {
        Some(version) if version != db::CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                found = version,
                expected = db::CURRENT_SCHEMA_VERSION,
                "schema 版本与当前代码不一致"
            );
        }
        Some(_) => {}
        None => tracing::warn!("未找到 schema_version 表"),
    }

    let conn = Arc::new(Mutex::new(conn));

    // 仓储与配置共用同一连接
    let lot_repo = Arc::new(LotRepository::from_connection(Arc::clone(&conn)));
    let allocation_repo = Arc::new(AllocationRepository::from_connection(Arc::clone(&conn)));
    let report_repo = Arc::new(ReconReportRepository::from_connection(Arc::clone(&conn)));
    let config = ConfigManager::from_connection(Arc::clone(&conn))
        .map_err(|e| anyhow!("配置管理器初始化失败: {}", e))?;

    // 配置在运行开始时快照一次
    let ctx = RunContext::from_config(&config)
        .await
        .map_err(|e| anyhow!("运行上下文构建失败: {}", e))?;

    let orchestrator = ReconcileOrchestrator::new(
        Arc::clone(&lot_repo),
        allocation_repo,
        lot_repo,
        report_repo,
        Arc::new(LogAlertSink),
    );

    let report = orchestrator.run(ctx).await;

    tracing::info!(
        report_id = %report.report_id,
        total_lots = report.total_lots,
        clean_lots = report.clean_lots,
        lots_with_issues = report.lots_with_issues,
        corrections_applied = report.corrections_applied,
        corrections_failed = report.corrections_failed,
        "对账批处理完成"
    );

    if !report.execution_errors.is_empty() {
        for err in &report.execution_errors {
            tracing::warn!("执行错误: {}", err);
        }
    }

    Ok(())
}
