//! 回执渲染服务 - 业务能力层
//!
//! 把回执 HTML 转成 PDF

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::PageDriver;

/// HTML 转 PDF 能力
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    async fn render_pdf(&self, html: &str, path: &Path) -> AppResult<()>;
}

/// 用浏览器的打印功能生成 PDF
///
/// 使用独立的空白页面，不影响下单页面的状态
pub struct ChromePdfRenderer {
    driver: PageDriver,
}

impl ChromePdfRenderer {
    pub fn new(driver: PageDriver) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl ReceiptRenderer for ChromePdfRenderer {
    async fn render_pdf(&self, html: &str, path: &Path) -> AppResult<()> {
        let document = wrap_receipt(html);
        self.driver.set_content(&document).await?;
        self.driver.print_pdf(path).await?;
        debug!("回执已保存: {}", path.display());
        Ok(())
    }
}

/// 回执区域只有片段，补全成完整文档再打印
fn wrap_receipt(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
        fragment
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_receipt() {
        let doc = wrap_receipt("<h3>Receipt</h3>");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<body><h3>Receipt</h3></body>"));
    }
}
