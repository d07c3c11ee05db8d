//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **浏览器初始化**：按 `BrowserSettings` 启动或连接浏览器
//! 2. **能力装配**：用真实的浏览器、HTTP、PDF、ZIP 实现构建 `Capabilities`
//! 3. **运行**：交给 `Pipeline` 执行并输出统计
//!
//! 唯一持有 `Browser` 的模块

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser::{self, BrowserSettings};
use crate::config::Config;
use crate::infrastructure::PageDriver;
use crate::orchestrator::pipeline::{Capabilities, Pipeline};
use crate::services::{ChromePdfRenderer, HttpDownloader, LopdfMerger, RobotSpareBinSite, ZipArchiver};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    pipeline: Pipeline,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let settings = BrowserSettings::from_config(&config);
        let browser = browser::open_browser(&settings)
            .await
            .context("浏览器初始化失败")?;

        // 下单页面和打印回执用的页面分开
        let order_page = browser::blank_page(&browser).await?;
        let scratch_page = browser::blank_page(&browser).await?;

        let caps = Capabilities {
            site: Arc::new(RobotSpareBinSite::new(
                PageDriver::new(order_page, &settings),
                config.order_site_url.clone(),
            )),
            downloader: Arc::new(HttpDownloader::new()),
            renderer: Arc::new(ChromePdfRenderer::new(PageDriver::new(
                scratch_page,
                &settings,
            ))),
            merger: Arc::new(LopdfMerger::new(config.screenshot_coverage)),
            archiver: Arc::new(ZipArchiver::new()),
        };

        let pipeline = Pipeline::new(config.clone(), caps);
        Ok(Self {
            config,
            browser,
            pipeline,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        let started = Instant::now();
        let result = self.pipeline.run().await;

        // 连接的是外部浏览器时不关闭它
        if self.config.browser_debug_port.is_none() {
            if let Err(e) = self.browser.close().await {
                warn!("⚠️ 关闭浏览器失败: {}", e);
            }
            let _ = self.browser.wait().await;
        }

        let summary = result.context("下单流程失败")?;
        logging::print_final_stats(&summary, started.elapsed());
        info!("✅ 全部完成");
        Ok(())
    }
}
