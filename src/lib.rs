//! # Robot Order Submit
//!
//! 自动在 RobotSpareBin Industries 网站批量下单的 Rust 应用程序
//!
//! ## 流程
//!
//! 初始化浏览器 → 打开网站 → 下载订单 CSV → 逐单填写、提交、保存回执和截图 →
//! 打包回执 → 清理中间目录
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动或连接浏览器
//! - `infrastructure/` - `PageDriver` 持有 Page，只暴露页面操作能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 每个外部能力一个 trait，可替换为测试用的假实现
//! - `OrderSite` / `FeedDownloader` / `ReceiptRenderer` / `ReceiptMerger` / `Archiver`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整处理流程
//! - `OrderCtx` - 上下文封装（订单号 + 序号）
//! - `OrderFlow` - 流程编排（填写 → 提交 → 回执 → 截图 → 合并 → 下一单）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 流水线，依赖注入的能力
//! - `orchestrator/app` - 装配真实能力并运行
//! - `orchestrator/workspace` - 工作目录守卫

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::PageDriver;
pub use models::{HeadOption, Order};
pub use orchestrator::{App, Capabilities, Pipeline, RunSummary};
pub use workflow::{OrderCtx, OrderFlow};
