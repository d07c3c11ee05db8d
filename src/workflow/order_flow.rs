//! 订单处理流程 - 流程层
//!
//! 核心职责：定义"一个订单"的完整处理流程
//!
//! 流程顺序：
//! 1. 填写表单
//! 2. 提交（有限次重试）
//! 3. 回执 HTML → PDF
//! 4. 截取机器人预览
//! 5. 截图嵌入 PDF
//! 6. 再来一单 + 关闭弹窗

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::Order;
use crate::services::{OrderSite, ReceiptMerger, ReceiptRenderer};
use crate::workflow::order_ctx::OrderCtx;

/// 提交重试策略
///
/// 第 n 次失败后等待 `initial_backoff * 2^(n-1)`，不超过 `max_backoff`
#[derive(Debug, Clone)]
pub struct SubmitRetry {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl SubmitRetry {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.submit_max_attempts,
            initial_backoff: Duration::from_millis(config.submit_backoff_ms),
            max_backoff: Duration::from_millis(config.submit_backoff_max_ms),
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

impl Default for SubmitRetry {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 单个订单的产物路径
#[derive(Debug, Clone)]
pub struct OrderArtifacts {
    pub receipt: PathBuf,
    pub screenshot: PathBuf,
}

/// 订单处理结果
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub order_number: u32,
    /// 提交成功时用了几次
    pub submit_attempts: u32,
}

/// 订单处理流程
///
/// - 编排单个订单的完整处理流程
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct OrderFlow {
    site: Arc<dyn OrderSite>,
    renderer: Arc<dyn ReceiptRenderer>,
    merger: Arc<dyn ReceiptMerger>,
    retry: SubmitRetry,
}

impl OrderFlow {
    pub fn new(
        site: Arc<dyn OrderSite>,
        renderer: Arc<dyn ReceiptRenderer>,
        merger: Arc<dyn ReceiptMerger>,
        retry: SubmitRetry,
    ) -> Self {
        Self {
            site,
            renderer,
            merger,
            retry,
        }
    }

    pub async fn run(
        &self,
        order: &Order,
        ctx: &OrderCtx,
        artifacts: &OrderArtifacts,
    ) -> AppResult<OrderOutcome> {
        // ========== 1. 填写表单 ==========
        debug!(
            "{} 头部: {}, 身体: {}, 腿部: {}, 地址: {}",
            ctx,
            order.head.label(),
            order.body,
            order.legs,
            order.address
        );
        self.site.fill_order(order).await?;

        // ========== 2. 提交 ==========
        let submit_attempts = self.submit(ctx).await?;

        // ========== 3. 回执 PDF ==========
        let html = self.site.receipt_html().await?;
        self.renderer.render_pdf(&html, &artifacts.receipt).await?;
        debug!("{} 📄 回执: {}", ctx, artifacts.receipt.display());

        // ========== 4. 截图 ==========
        self.site.capture_preview(&artifacts.screenshot).await?;
        debug!("{} 📸 截图: {}", ctx, artifacts.screenshot.display());

        // ========== 5. 合并 ==========
        self.merger
            .embed_image(&artifacts.screenshot, &artifacts.receipt)
            .await?;

        // ========== 6. 准备下一单 ==========
        self.site.order_another().await?;

        info!("{} ✓ 订单完成", ctx);
        Ok(OrderOutcome {
            order_number: order.order_number,
            submit_attempts,
        })
    }

    /// 提交直到出现"再来一单"按钮，返回尝试次数
    ///
    /// 每次提交失败后先退避，再复查一次确认按钮；回执渲染较慢时
    /// 订单其实已经提交成功，此时不能再点提交按钮
    async fn submit(&self, ctx: &OrderCtx) -> AppResult<u32> {
        for attempt in 1..=self.retry.max_attempts {
            if self.site.submit().await? {
                if attempt > 1 {
                    info!("{} ✓ 第 {} 次提交成功", ctx, attempt);
                }
                return Ok(attempt);
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                "{} ⚠️ 提交未确认 (尝试 {}/{}), {:?} 后复查...",
                ctx, attempt, self.retry.max_attempts, delay
            );
            sleep(delay).await;

            if self.site.is_confirmed().await? {
                info!("{} ✓ 第 {} 次提交已确认（页面延迟）", ctx, attempt);
                return Ok(attempt);
            }
        }

        Err(AppError::SubmitExhausted {
            order_number: ctx.order_number,
            attempts: self.retry.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = SubmitRetry {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(500));
        assert_eq!(retry.backoff(2), Duration::from_millis(1000));
        assert_eq!(retry.backoff(3), Duration::from_millis(2000));
        assert_eq!(retry.backoff(4), Duration::from_millis(4000));
        assert_eq!(retry.backoff(5), Duration::from_secs(5));
        assert_eq!(retry.backoff(40), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_zero_stays_zero() {
        let retry = SubmitRetry {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::from_secs(5),
        };
        assert_eq!(retry.backoff(3), Duration::ZERO);
    }
}
