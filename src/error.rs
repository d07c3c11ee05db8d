use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
///
/// 按流水线阶段划分，任何一个错误都会终止整个运行
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误（导航、元素未找到、脚本执行）
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 订单文件下载失败
    #[error("下载 {url} 失败: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 订单 CSV 解析或校验失败
    #[error("订单数据错误: {0}")]
    Feed(String),

    /// 提交重试次数耗尽
    #[error("订单 {order_number} 提交失败，已尝试 {attempts} 次")]
    SubmitExhausted { order_number: u32, attempts: u32 },

    /// 回执 PDF 生成或合并失败
    #[error("回执处理失败 ({path}): {message}")]
    Receipt { path: PathBuf, message: String },

    /// 打包失败
    #[error("打包失败 ({path}): {message}")]
    Archive { path: PathBuf, message: String },

    /// 工作目录操作失败
    #[error("工作目录操作失败 ({path}): {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 其他 IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(format!("脚本返回值解析失败: {}", err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Feed(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建下载错误
    pub fn download_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Download {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// 创建回执错误
    pub fn receipt_failed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AppError::Receipt {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// 创建打包错误
    pub fn archive_failed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AppError::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// 创建工作目录错误
    pub fn workspace_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Workspace {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
