//! 下单网站适配器 - 业务能力层
//!
//! 所有选择器都集中在 `SiteSelectors` 中，页面结构变化只需修改这里

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::PageDriver;
use crate::models::Order;

/// 下单网站能力
#[async_trait]
pub trait OrderSite: Send + Sync {
    /// 打开下单页面并关闭首次弹窗
    async fn open(&self) -> AppResult<()>;

    /// 填写订单表单（不提交）
    async fn fill_order(&self, order: &Order) -> AppResult<()>;

    /// 点击提交，返回页面是否出现"再来一单"按钮
    async fn submit(&self) -> AppResult<bool>;

    /// 立即检查"再来一单"按钮是否已出现，不点击任何东西
    async fn is_confirmed(&self) -> AppResult<bool>;

    /// 获取回执区域的 HTML
    async fn receipt_html(&self) -> AppResult<String>;

    /// 截取机器人预览区域
    async fn capture_preview(&self, path: &Path) -> AppResult<()>;

    /// 点击"再来一单"并关闭随后弹出的确认框
    async fn order_another(&self) -> AppResult<()>;
}

/// 页面选择器
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// 弹窗确认按钮的文本
    pub modal_ok_text: String,
    pub head_select: String,
    /// `{body}` 会被替换为身体型号序号
    pub body_xpath_template: String,
    pub legs_input: String,
    pub address_input: String,
    pub submit_button: String,
    pub order_another_button: String,
    pub receipt: String,
    pub robot_preview: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            modal_ok_text: "OK".to_string(),
            head_select: "#head".to_string(),
            body_xpath_template:
                r#"//*[@id="root"]/div/div[1]/div/div[1]/form/div[2]/div/div[{body}]/label"#
                    .to_string(),
            legs_input: "input[placeholder='Enter the part number for the legs']".to_string(),
            address_input: "#address".to_string(),
            submit_button: "#order".to_string(),
            order_another_button: "#order-another".to_string(),
            receipt: "#receipt".to_string(),
            robot_preview: "#robot-preview-image".to_string(),
        }
    }
}

impl SiteSelectors {
    pub fn body_xpath(&self, body: u32) -> String {
        self.body_xpath_template
            .replace("{body}", &body.to_string())
    }
}

/// RobotSpareBin Industries 下单网站
pub struct RobotSpareBinSite {
    driver: PageDriver,
    url: String,
    selectors: SiteSelectors,
}

impl RobotSpareBinSite {
    pub fn new(driver: PageDriver, url: impl Into<String>) -> Self {
        Self {
            driver,
            url: url.into(),
            selectors: SiteSelectors::default(),
        }
    }

    async fn dismiss_modal(&self) -> AppResult<()> {
        self.driver
            .click_button_text(&self.selectors.modal_ok_text)
            .await
    }
}

#[async_trait]
impl OrderSite for RobotSpareBinSite {
    async fn open(&self) -> AppResult<()> {
        self.driver.goto(&self.url).await?;
        self.dismiss_modal().await
    }

    async fn fill_order(&self, order: &Order) -> AppResult<()> {
        let s = &self.selectors;
        debug!(
            "填写订单 {}: head={}, body={}",
            order.order_number,
            order.head.label(),
            order.body
        );
        self.driver
            .select_option_by_label(&s.head_select, order.head.label())
            .await?;
        self.driver.click_xpath(&s.body_xpath(order.body)).await?;
        self.driver.fill(&s.legs_input, &order.legs).await?;
        self.driver.fill(&s.address_input, &order.address).await?;
        Ok(())
    }

    async fn submit(&self) -> AppResult<bool> {
        self.driver.click(&self.selectors.submit_button).await?;
        self.is_confirmed().await
    }

    async fn is_confirmed(&self) -> AppResult<bool> {
        self.driver
            .exists(&self.selectors.order_another_button)
            .await
    }

    async fn receipt_html(&self) -> AppResult<String> {
        self.driver.inner_html(&self.selectors.receipt).await
    }

    async fn capture_preview(&self, path: &Path) -> AppResult<()> {
        self.driver
            .screenshot_element(&self.selectors.robot_preview, path)
            .await
    }

    async fn order_another(&self) -> AppResult<()> {
        self.driver
            .click(&self.selectors.order_another_button)
            .await?;
        self.dismiss_modal().await
    }
}
