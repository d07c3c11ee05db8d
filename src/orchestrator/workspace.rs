//! 工作目录管理 - 编排层
//!
//! `Workspace` 在创建时建好回执和截图目录，在 `cleanup` 时删除。
//! 如果运行中途失败，守卫被 drop 时按配置删除或保留这两个目录。

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::workflow::OrderArtifacts;

/// 工作目录守卫
#[derive(Debug)]
pub struct Workspace {
    output_dir: PathBuf,
    receipts_dir: PathBuf,
    screenshots_dir: PathBuf,
    archive_path: PathBuf,
    preserve_on_failure: bool,
    armed: bool,
}

impl Workspace {
    /// 创建工作目录，并清理上一次失败运行留下的中间目录
    pub fn prepare(config: &Config) -> AppResult<Self> {
        let workspace = Self {
            output_dir: config.output_path(),
            receipts_dir: config.receipts_dir(),
            screenshots_dir: config.screenshots_dir(),
            archive_path: config.archive_path(),
            preserve_on_failure: config.preserve_artifacts_on_failure,
            armed: true,
        };

        for dir in [&workspace.receipts_dir, &workspace.screenshots_dir] {
            if dir.exists() {
                warn!("⚠️ 发现上次运行遗留的目录，已清空: {}", dir.display());
                remove_dir(dir)?;
            }
        }
        for dir in [
            &workspace.output_dir,
            &workspace.receipts_dir,
            &workspace.screenshots_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| AppError::workspace_failed(dir, e))?;
        }

        debug!("工作目录已就绪: {}", workspace.output_dir.display());
        Ok(workspace)
    }

    pub fn receipts_dir(&self) -> &Path {
        &self.receipts_dir
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn receipt_path(&self, order_number: u32) -> PathBuf {
        self.receipts_dir.join(format!("{}.pdf", order_number))
    }

    pub fn screenshot_path(&self, order_number: u32) -> PathBuf {
        self.screenshots_dir.join(format!("{}.png", order_number))
    }

    pub fn artifacts_for(&self, order_number: u32) -> OrderArtifacts {
        OrderArtifacts {
            receipt: self.receipt_path(order_number),
            screenshot: self.screenshot_path(order_number),
        }
    }

    /// 删除回执和截图目录（正常结束时调用）
    pub fn cleanup(mut self) -> AppResult<()> {
        self.armed = false;
        remove_dir(&self.receipts_dir)?;
        remove_dir(&self.screenshots_dir)?;
        info!("🧹 已删除中间目录: {}, {}", self.receipts_dir.display(), self.screenshots_dir.display());
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if self.preserve_on_failure {
            warn!(
                "⚠️ 运行未完成，保留中间目录以便排查: {}, {}",
                self.receipts_dir.display(),
                self.screenshots_dir.display()
            );
            return;
        }

        for dir in [&self.receipts_dir, &self.screenshots_dir] {
            if let Err(e) = remove_dir(dir) {
                warn!("⚠️ 清理中间目录失败: {}", e);
            }
        }
        warn!("⚠️ 运行未完成，已清理中间目录");
    }
}

fn remove_dir(dir: &Path) -> AppResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::workspace_failed(dir, e)),
    }
}
