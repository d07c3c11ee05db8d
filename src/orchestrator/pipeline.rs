//! 下单流水线 - 编排层
//!
//! ## 阶段
//!
//! 1. 打开网站（关闭首次弹窗）
//! 2. 下载订单 CSV
//! 3. 逐个处理订单
//! 4. 打包回执
//! 5. 清理中间目录
//!
//! 浏览器的初始化在 `App` 中完成，这里只依赖注入的能力，
//! 因此可以用假的实现测试整个流程。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_orders, Order};
use crate::orchestrator::workspace::Workspace;
use crate::services::{Archiver, FeedDownloader, OrderSite, ReceiptMerger, ReceiptRenderer};
use crate::utils::logging;
use crate::workflow::{OrderCtx, OrderFlow, OrderOutcome, SubmitRetry};

/// 流水线依赖的外部能力
#[derive(Clone)]
pub struct Capabilities {
    pub site: Arc<dyn OrderSite>,
    pub downloader: Arc<dyn FeedDownloader>,
    pub renderer: Arc<dyn ReceiptRenderer>,
    pub merger: Arc<dyn ReceiptMerger>,
    pub archiver: Arc<dyn Archiver>,
}

/// 运行结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// 处理的订单数
    pub orders: usize,
    /// 压缩包中的文件数
    pub archived: usize,
    pub archive_path: PathBuf,
    /// 所有订单的提交次数之和
    pub submit_attempts: u32,
}

/// 下单流水线
pub struct Pipeline {
    config: Config,
    caps: Capabilities,
}

impl Pipeline {
    pub fn new(config: Config, caps: Capabilities) -> Self {
        Self { config, caps }
    }

    /// 运行全部阶段，任一阶段失败立即返回
    pub async fn run(&self) -> AppResult<RunSummary> {
        // ========== 打开网站 ==========
        info!("🌐 打开下单页面: {}", self.config.order_site_url);
        self.caps.site.open().await?;

        // ========== 下载订单 ==========
        let csv_path = Path::new(&self.config.orders_csv_path);
        info!("📥 下载订单文件: {}", self.config.orders_csv_url);
        self.caps
            .downloader
            .download(&self.config.orders_csv_url, csv_path)
            .await?;

        // ========== 处理订单 ==========
        let orders = load_orders(csv_path).await?;
        let workspace = Workspace::prepare(&self.config)?;
        let outcomes = self.process_orders(&orders, &workspace).await?;

        // ========== 打包 ==========
        info!("📦 打包回执: {}", workspace.archive_path().display());
        let archived = self
            .caps
            .archiver
            .archive_dir(workspace.receipts_dir(), workspace.archive_path())
            .await?;
        let archive_path = workspace.archive_path().to_path_buf();

        // ========== 清理 ==========
        workspace.cleanup()?;

        Ok(RunSummary {
            orders: outcomes.len(),
            archived,
            archive_path,
            submit_attempts: outcomes.iter().map(|o| o.submit_attempts).sum(),
        })
    }

    /// 按 CSV 顺序处理订单
    async fn process_orders(
        &self,
        orders: &[Order],
        workspace: &Workspace,
    ) -> AppResult<Vec<OrderOutcome>> {
        let flow = OrderFlow::new(
            self.caps.site.clone(),
            self.caps.renderer.clone(),
            self.caps.merger.clone(),
            SubmitRetry::from_config(&self.config),
        );

        let total = orders.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, order) in orders.iter().enumerate() {
            let ctx = OrderCtx::new(order.order_number, index + 1, total);
            logging::log_order_start(&ctx);

            let artifacts = workspace.artifacts_for(order.order_number);
            outcomes.push(flow.run(order, &ctx, &artifacts).await?);
        }
        Ok(outcomes)
    }
}
