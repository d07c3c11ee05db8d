//! 打包服务 - 业务能力层

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, AppResult};

/// 打包能力
#[async_trait]
pub trait Archiver: Send + Sync {
    /// 把 `source_dir` 下的所有文件打包到 `archive_path`，返回文件数
    async fn archive_dir(&self, source_dir: &Path, archive_path: &Path) -> AppResult<usize>;
}

/// ZIP 打包
#[derive(Debug, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive_dir(&self, source_dir: &Path, archive_path: &Path) -> AppResult<usize> {
        let source = source_dir.to_path_buf();
        let archive: PathBuf = archive_path.to_path_buf();
        let target = archive.clone();
        tokio::task::spawn_blocking(move || zip_dir(&source, &archive))
            .await
            .map_err(|e| AppError::archive_failed(target, e))?
    }
}

/// 只打包目录下的第一层普通文件，条目名为文件名，按名称排序
pub fn zip_dir(source_dir: &Path, archive_path: &Path) -> AppResult<usize> {
    if !source_dir.is_dir() {
        return Err(AppError::archive_failed(
            source_dir,
            "待打包目录不存在",
        ));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(source_dir).map_err(|e| AppError::archive_failed(source_dir, e))? {
        let entry = entry.map_err(|e| AppError::archive_failed(source_dir, e))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(AppError::archive_failed(source_dir, "待打包目录为空"));
    }

    let file = File::create(archive_path).map_err(|e| AppError::archive_failed(archive_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("打包: {}", name);

        zip.start_file(name, options)
            .map_err(|e| AppError::archive_failed(archive_path, e))?;
        let mut src = File::open(path).map_err(|e| AppError::archive_failed(path, e))?;
        io::copy(&mut src, &mut zip).map_err(|e| AppError::archive_failed(archive_path, e))?;
    }

    zip.finish()
        .map_err(|e| AppError::archive_failed(archive_path, e))?;
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use zip::ZipArchive;

    fn entry_names(archive_path: &Path) -> BTreeSet<String> {
        let archive = ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_zip_dir_set_equality() {
        let dir = tempfile::tempdir().unwrap();
        let receipts = dir.path().join("receipts");
        std::fs::create_dir(&receipts).unwrap();
        std::fs::write(receipts.join("1.pdf"), b"%PDF-1").unwrap();
        std::fs::write(receipts.join("2.pdf"), b"%PDF-2").unwrap();
        std::fs::write(receipts.join("10.pdf"), b"%PDF-10").unwrap();
        std::fs::create_dir(receipts.join("nested")).unwrap();

        let archive = dir.path().join("receipts.zip");
        let count = zip_dir(&receipts, &archive).unwrap();

        assert_eq!(count, 3);
        let expected: BTreeSet<String> = ["1.pdf", "10.pdf", "2.pdf"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(entry_names(&archive), expected);
    }

    #[test]
    fn test_zip_dir_content_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let receipts = dir.path().join("receipts");
        std::fs::create_dir(&receipts).unwrap();
        std::fs::write(receipts.join("7.pdf"), b"receipt seven").unwrap();
        let archive_path = dir.path().join("receipts.zip");

        zip_dir(&receipts, &archive_path).unwrap();

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut entry = archive.by_name("7.pdf").unwrap();
        let mut content = Vec::new();
        io::copy(&mut entry, &mut content).unwrap();
        assert_eq!(content, b"receipt seven");
    }

    #[test]
    fn test_zip_dir_missing_or_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("out.zip");

        let missing = zip_dir(&dir.path().join("nope"), &archive);
        assert!(matches!(missing, Err(AppError::Archive { .. })));

        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        assert!(matches!(zip_dir(&empty, &archive), Err(AppError::Archive { .. })));
        assert!(!archive.exists());
    }

    #[tokio::test]
    async fn test_zip_archiver_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let receipts = dir.path().join("receipts");
        std::fs::create_dir(&receipts).unwrap();
        std::fs::write(receipts.join("1.pdf"), b"one").unwrap();
        let archive = dir.path().join("receipts.zip");
        std::fs::write(&archive, b"stale archive").unwrap();

        let count = ZipArchiver::new()
            .archive_dir(&receipts, &archive)
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(entry_names(&archive).len(), 1);
    }
}
