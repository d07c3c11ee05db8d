//! 订单文件下载服务 - 业务能力层

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// 下载能力
#[async_trait]
pub trait FeedDownloader: Send + Sync {
    /// 下载 `url` 到 `dest`，覆盖已有文件，返回写入的字节数
    async fn download(&self, url: &str, dest: &Path) -> AppResult<u64>;
}

/// 基于 reqwest 的 HTTP 下载
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> AppResult<u64> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::download_failed(url, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::download_failed(url, e))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| AppError::workspace_failed(dest, e))?;

        info!("✓ 已下载 {} ({} 字节)", dest.display(), bytes.len());
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 在本地端口上返回一次固定的 HTTP 响应，返回请求地址
    async fn serve_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/orders.csv", addr)
    }

    #[tokio::test]
    async fn test_download_not_found_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("orders.csv");
        std::fs::write(&dest, "older content").unwrap();
        let url = serve_once("404 Not Found", "missing").await;

        let err = HttpDownloader::new().download(&url, &dest).await.unwrap_err();

        match err {
            AppError::Download { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "older content");
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("orders.csv");
        std::fs::write(&dest, "older content").unwrap();
        let url = serve_once("200 OK", "new").await;

        let written = HttpDownloader::new().download(&url, &dest).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
    }
}
