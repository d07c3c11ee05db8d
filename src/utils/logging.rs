//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::RunSummary;
use crate::workflow::OrderCtx;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 机器人订单自动提交 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 下单页面: {}", config.order_site_url);
    info!("📁 输出目录: {}", config.output_dir);
    info!("⏱️ 交互间隔: {} ms", config.slow_mo_ms);
    info!("{}", "=".repeat(60));
}

/// 记录订单开始信息
pub fn log_order_start(ctx: &OrderCtx) {
    info!("\n{}", "─".repeat(60));
    info!("{} 🤖 开始处理", ctx);
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, elapsed: Duration) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 订单: {}", summary.orders);
    info!("🔁 提交次数: {}", summary.submit_attempts);
    info!("📦 压缩包: {} ({} 个回执)", summary.archive_path.display(), summary.archived);
    info!("⏱️ 耗时: {:.1} 秒", elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
}
