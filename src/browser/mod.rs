//! 浏览器基础设施
//!
//! 启动或连接 Chromium，并把交互节奏等设置作为显式对象传给 `PageDriver`

pub mod connection;
pub mod launch;

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tracing::debug;

use crate::config::Config;
use crate::error::AppResult;

pub use connection::connect_to_browser;
pub use launch::launch_browser;

/// 浏览器设置
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// 每次交互后的等待时间
    pub slow_mo: Duration,
    /// 等待元素出现的最长时间
    pub element_timeout: Duration,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    /// 设置后连接该端口上的浏览器
    pub debug_port: Option<u16>,
}

impl BrowserSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            slow_mo: Duration::from_millis(config.slow_mo_ms),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
            headless: config.headless,
            chrome_executable: config.chrome_executable.as_ref().map(PathBuf::from),
            debug_port: config.browser_debug_port,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 获取浏览器：有调试端口时连接，否则启动新的实例
pub async fn open_browser(settings: &BrowserSettings) -> AppResult<Browser> {
    match settings.debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_browser(settings).await,
    }
}

/// 创建空白页面
pub async fn blank_page(browser: &Browser) -> AppResult<Page> {
    let page = browser.new_page("about:blank").await?;
    debug!("空白页面创建成功");
    Ok(page)
}

/// 在后台处理浏览器事件
pub(crate) fn spawn_handler(mut handler: chromiumoxide::Handler) {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });
}
