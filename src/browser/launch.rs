use chromiumoxide::{Browser, BrowserConfig};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::{spawn_handler, BrowserSettings};
use crate::error::{AppError, AppResult};

/// 启动浏览器
///
/// 打印 PDF 只在无头模式下可用，有头模式仅用于调试下单流程
pub async fn launch_browser(settings: &BrowserSettings) -> AppResult<Browser> {
    info!(
        "🚀 启动浏览器 ({})...",
        if settings.headless { "无头" } else { "有头" }
    );

    let mut builder = BrowserConfig::builder().window_size(1280, 1024).args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
    ]);
    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = &settings.chrome_executable {
        debug!("使用浏览器: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(format!("配置浏览器失败: {}", e))
    })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    spawn_handler(handler);

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}
