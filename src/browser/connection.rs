use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::spawn_handler;
use crate::error::{AppError, AppResult};

/// 连接到已经开启远程调试的浏览器
pub async fn connect_to_browser(port: u16) -> AppResult<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::Browser(format!("无法连接到浏览器 (端口: {}): {}", port, e))
    })?;
    debug!("浏览器连接成功");

    spawn_handler(handler);

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}
