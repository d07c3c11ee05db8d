//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 初始化浏览器（唯一持有 Browser）
//! - 装配真实的外部能力
//!
//! ### `pipeline` - 下单流水线
//! - 打开网站 → 下载订单 → 逐单处理 → 打包 → 清理
//! - 只依赖注入的能力（`Capabilities`）
//!
//! ### `workspace` - 工作目录守卫
//! - 创建、清理回执和截图目录
//! - 失败时按配置删除或保留
//!
//! ## 层次关系
//!
//! ```text
//! app (Browser + 装配)
//!     ↓
//! pipeline (处理 Vec<Order>)
//!     ↓
//! workflow::OrderFlow (处理单个 Order)
//!     ↓
//! services (能力层：site / download / render / merge / archive)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod app;
pub mod pipeline;
pub mod workspace;

// 重新导出主要类型
pub use app::App;
pub use pipeline::{Capabilities, Pipeline, RunSummary};
pub use workspace::Workspace;
