use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 默认配置文件名
const DEFAULT_CONFIG_FILE: &str = "robot_order.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 下单页面 URL
    pub order_site_url: String,
    /// 订单 CSV 下载地址
    pub orders_csv_url: String,
    /// 订单 CSV 本地保存路径
    pub orders_csv_path: String,
    /// 输出根目录（回执、截图、压缩包）
    pub output_dir: String,
    /// 每次页面交互后的等待时间（毫秒）
    pub slow_mo_ms: u64,
    /// 等待页面元素出现的超时（毫秒）
    pub element_timeout_ms: u64,
    /// 是否使用无头浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径，为空时自动查找
    pub chrome_executable: Option<String>,
    /// 浏览器调试端口，设置后连接已有浏览器而不是启动新的
    pub browser_debug_port: Option<u16>,
    // --- 提交重试 ---
    pub submit_max_attempts: u32,
    pub submit_backoff_ms: u64,
    pub submit_backoff_max_ms: u64,
    /// 失败时是否保留回执和截图目录
    pub preserve_artifacts_on_failure: bool,
    /// 截图在回执页面上所占的面积比例
    pub screenshot_coverage: f32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order_site_url: "https://robotsparebinindustries.com/#/robot-order".to_string(),
            orders_csv_url: "https://robotsparebinindustries.com/orders.csv".to_string(),
            orders_csv_path: "orders.csv".to_string(),
            output_dir: "output".to_string(),
            slow_mo_ms: 200,
            element_timeout_ms: 10_000,
            headless: true,
            chrome_executable: None,
            browser_debug_port: None,
            submit_max_attempts: 10,
            submit_backoff_ms: 500,
            submit_backoff_max_ms: 5_000,
            preserve_artifacts_on_failure: false,
            screenshot_coverage: 0.2,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("ROBOT_ORDER_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };
        base.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件读取，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 抽象了环境读取，测试时可以传入固定的映射
    pub fn with_env_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ORDER_SITE_URL") {
            self.order_site_url = v;
        }
        if let Some(v) = lookup("ORDERS_CSV_URL") {
            self.orders_csv_url = v;
        }
        if let Some(v) = lookup("ORDERS_CSV_PATH") {
            self.orders_csv_path = v;
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = lookup("SLOW_MO_MS") {
            self.slow_mo_ms = parse_var("SLOW_MO_MS", &v)?;
        }
        if let Some(v) = lookup("ELEMENT_TIMEOUT_MS") {
            self.element_timeout_ms = parse_var("ELEMENT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("HEADLESS") {
            self.headless = parse_var("HEADLESS", &v)?;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = lookup("BROWSER_DEBUG_PORT") {
            self.browser_debug_port = Some(parse_var("BROWSER_DEBUG_PORT", &v)?);
        }
        if let Some(v) = lookup("SUBMIT_MAX_ATTEMPTS") {
            self.submit_max_attempts = parse_var("SUBMIT_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("SUBMIT_BACKOFF_MS") {
            self.submit_backoff_ms = parse_var("SUBMIT_BACKOFF_MS", &v)?;
        }
        if let Some(v) = lookup("SUBMIT_BACKOFF_MAX_MS") {
            self.submit_backoff_max_ms = parse_var("SUBMIT_BACKOFF_MAX_MS", &v)?;
        }
        if let Some(v) = lookup("PRESERVE_ARTIFACTS_ON_FAILURE") {
            self.preserve_artifacts_on_failure = parse_var("PRESERVE_ARTIFACTS_ON_FAILURE", &v)?;
        }
        if let Some(v) = lookup("SCREENSHOT_COVERAGE") {
            self.screenshot_coverage = parse_var("SCREENSHOT_COVERAGE", &v)?;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v)?;
        }
        self.validate()
    }

    fn validate(self) -> AppResult<Self> {
        if self.submit_max_attempts == 0 {
            return Err(AppError::Config("submit_max_attempts 必须大于 0".to_string()));
        }
        if !(self.screenshot_coverage > 0.0 && self.screenshot_coverage <= 1.0) {
            return Err(AppError::Config(format!(
                "screenshot_coverage 必须在 (0, 1] 之间，当前值: {}",
                self.screenshot_coverage
            )));
        }
        Ok(self)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.output_path().join("receipts")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.output_path().join("screenshots")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_path().join("receipts.zip")
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::Config(format!(
            "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
            name,
            value,
            std::any::type_name::<T>()
        ))
    })
}
