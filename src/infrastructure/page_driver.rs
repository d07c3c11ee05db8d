//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"页面操作"的能力

use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::debug;

use crate::browser::BrowserSettings;
use crate::error::{AppError, AppResult};

/// 等待元素出现时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 页面驱动
///
/// 职责：
/// - 持有 Page 资源
/// - 提供点击、填写、截图、执行 JS 等原子操作
/// - 每次交互后按 `slow_mo` 暂停
/// - 不认识订单，不包含选择器
pub struct PageDriver {
    page: Page,
    slow_mo: Duration,
    element_timeout: Duration,
}

impl PageDriver {
    pub fn new(page: Page, settings: &BrowserSettings) -> Self {
        Self {
            page,
            slow_mo: settings.slow_mo,
            element_timeout: settings.element_timeout,
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 导航到指定 URL
    pub async fn goto(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::Browser(format!("导航到 {} 失败: {}", url, e)))?;
        self.pace().await;
        Ok(())
    }

    /// 立即检查元素是否存在，不等待
    pub async fn exists(&self, selector: &str) -> AppResult<bool> {
        let js = format!("!!document.querySelector({})", js_str(selector));
        self.eval_as(js).await
    }

    /// 等待元素出现，超时返回错误
    pub async fn wait_for(&self, selector: &str) -> AppResult<Element> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(AppError::Browser(format!(
                    "等待元素超时 ({:?}): {}",
                    self.element_timeout, selector
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 点击 CSS 选择器匹配的元素
    pub async fn click(&self, selector: &str) -> AppResult<()> {
        debug!("点击: {}", selector);
        let element = self.wait_for(selector).await?;
        element
            .click()
            .await
            .map_err(|e| AppError::Browser(format!("点击 {} 失败: {}", selector, e)))?;
        self.pace().await;
        Ok(())
    }

    /// 点击文本为 `text` 的按钮
    pub async fn click_button_text(&self, text: &str) -> AppResult<()> {
        debug!("点击按钮: {}", text);
        let js = format!(
            r#"(() => {{
                const target = {};
                const button = Array.from(document.querySelectorAll('button'))
                    .find(b => b.innerText.trim() === target);
                if (!button) return false;
                button.click();
                return true;
            }})()"#,
            js_str(text)
        );
        self.retry_until_true(&js, &format!("按钮 '{}'", text)).await
    }

    /// 点击 XPath 匹配的第一个节点
    pub async fn click_xpath(&self, xpath: &str) -> AppResult<()> {
        debug!("点击 XPath: {}", xpath);
        let js = format!(
            r#"(() => {{
                const node = document.evaluate({}, document, null,
                    XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
                if (!node) return false;
                node.click();
                return true;
            }})()"#,
            js_str(xpath)
        );
        self.retry_until_true(&js, &format!("XPath {}", xpath)).await
    }

    /// 按显示文本选择下拉框选项
    ///
    /// 通过原生 setter 赋值并派发 change 事件，React 表单才能感知
    pub async fn select_option_by_label(&self, selector: &str, label: &str) -> AppResult<()> {
        debug!("选择 {} -> {}", selector, label);
        self.wait_for(selector).await?;
        let js = format!(
            r#"(() => {{
                const select = document.querySelector({});
                if (!select) return false;
                const option = Array.from(select.options).find(o => o.text.trim() === {});
                if (!option) return false;
                const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set;
                setter.call(select, option.value);
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            js_str(selector),
            js_str(label)
        );
        let selected: bool = self.eval_as(js).await?;
        if !selected {
            return Err(AppError::Browser(format!(
                "下拉框 {} 中没有选项 '{}'",
                selector, label
            )));
        }
        self.pace().await;
        Ok(())
    }

    /// 清空输入框后输入文本
    pub async fn fill(&self, selector: &str, value: &str) -> AppResult<()> {
        debug!("填写 {}: {}", selector, value);
        let element = self.wait_for(selector).await?;
        self.clear_input(selector).await?;
        element.click().await?;
        element
            .type_str(value)
            .await
            .map_err(|e| AppError::Browser(format!("填写 {} 失败: {}", selector, e)))?;
        self.pace().await;
        Ok(())
    }

    /// 通过原生 setter 清空输入框并派发 input 事件
    async fn clear_input(&self, selector: &str) -> AppResult<()> {
        let cleared: bool = self.eval_as(clear_input_js(selector)).await?;
        if !cleared {
            return Err(AppError::Browser(format!("无法清空输入框 {}", selector)));
        }
        Ok(())
    }

    /// 获取元素的 innerHTML
    pub async fn inner_html(&self, selector: &str) -> AppResult<String> {
        let element = self.wait_for(selector).await?;
        let html = element.inner_html().await?;
        html.ok_or_else(|| AppError::Browser(format!("元素 {} 没有内容", selector)))
    }

    /// 截取元素区域并保存为 PNG
    pub async fn screenshot_element(&self, selector: &str, path: &Path) -> AppResult<()> {
        let element = self.wait_for(selector).await?;
        element
            .save_screenshot(CaptureScreenshotFormat::Png, path)
            .await
            .map_err(|e| {
                AppError::Browser(format!(
                    "截图 {} 保存到 {} 失败: {}",
                    selector,
                    path.display(),
                    e
                ))
            })?;
        Ok(())
    }

    /// 用给定的 HTML 替换整个页面
    pub async fn set_content(&self, html: &str) -> AppResult<()> {
        self.page.set_content(html).await?;
        Ok(())
    }

    /// 把当前页面打印为 PDF（仅无头模式可用）
    pub async fn print_pdf(&self, path: &Path) -> AppResult<()> {
        self.page
            .save_pdf(PrintToPdfParams::default(), path)
            .await
            .map_err(|e| AppError::receipt_failed(path, e))?;
        Ok(())
    }

    /// 反复执行返回布尔值的脚本，直到返回 true 或超时
    async fn retry_until_true(&self, js: &str, what: &str) -> AppResult<()> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let done: bool = self.eval_as(js.to_string()).await?;
            if done {
                self.pace().await;
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::Browser(format!("未找到 {}", what)));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn pace(&self) {
        if !self.slow_mo.is_zero() {
            sleep(self.slow_mo).await;
        }
    }
}

/// 转为 JS 字符串字面量
fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// 清空输入框的脚本，返回是否找到元素
fn clear_input_js(selector: &str) -> String {
    format!(
        r#"(() => {{
            const input = document.querySelector({});
            if (!input) return false;
            const setter = Object.getOwnPropertyDescriptor(HTMLInputElement.prototype, 'value').set;
            setter.call(input, '');
            input.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return true;
        }})()"#,
        js_str(selector)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str("OK"), "\"OK\"");
        assert_eq!(
            js_str("input[placeholder='Enter']"),
            "\"input[placeholder='Enter']\""
        );
        assert_eq!(js_str(r#"//*[@id="root"]"#), r#""//*[@id=\"root\"]""#);
    }

    #[test]
    fn test_clear_input_js_resets_value_and_notifies() {
        let js = clear_input_js("#address");
        assert!(js.contains(r##"document.querySelector("#address")"##));
        assert!(js.contains("setter.call(input, '')"));
        assert!(js.contains("new Event('input', { bubbles: true })"));
    }
}
