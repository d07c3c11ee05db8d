//! 回执合并服务 - 业务能力层
//!
//! 把机器人截图嵌入回执 PDF 的第一页

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 找不到 MediaBox 时使用 US Letter
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// 向上查找 MediaBox 的最大层数
const MAX_PARENT_DEPTH: usize = 16;

/// PDF 嵌图能力
#[async_trait]
pub trait ReceiptMerger: Send + Sync {
    /// 把 `image` 嵌入 `pdf`，原地覆盖
    async fn embed_image(&self, image: &Path, pdf: &Path) -> AppResult<()>;
}

/// 基于 lopdf 的实现
pub struct LopdfMerger {
    coverage: f32,
}

impl LopdfMerger {
    /// `coverage` 是图片占页面面积的比例
    pub fn new(coverage: f32) -> Self {
        Self { coverage }
    }
}

#[async_trait]
impl ReceiptMerger for LopdfMerger {
    async fn embed_image(&self, image: &Path, pdf: &Path) -> AppResult<()> {
        let image = image.to_path_buf();
        let pdf: PathBuf = pdf.to_path_buf();
        let coverage = self.coverage;

        let target = pdf.clone();
        tokio::task::spawn_blocking(move || embed_image_into_pdf(&image, &pdf, coverage))
            .await
            .map_err(|e| AppError::receipt_failed(target, e))?
    }
}

/// 同步版本，供阻塞线程调用
pub fn embed_image_into_pdf(image_path: &Path, pdf_path: &Path, coverage: f32) -> AppResult<()> {
    let img = image::open(image_path)
        .map_err(|e| AppError::receipt_failed(image_path, e))?
        .to_rgb8();
    let (img_w, img_h) = img.dimensions();

    let mut doc = Document::load(pdf_path).map_err(|e| AppError::receipt_failed(pdf_path, e))?;
    let page_id = doc
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| AppError::receipt_failed(pdf_path, "PDF 没有页面"))?;

    let (page_w, page_h) = page_size(&doc, page_id).unwrap_or(FALLBACK_PAGE_SIZE);
    let rect = placement((page_w, page_h), (img_w as f32, img_h as f32), coverage);
    debug!(
        "嵌入截图 {}x{} -> 页面 {}x{}, 位置 {:?}",
        img_w, img_h, page_w, page_h, rect
    );

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => img_w as i64,
            "Height" => img_h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        },
        img.into_raw(),
    );
    stream
        .compress()
        .map_err(|e| AppError::receipt_failed(pdf_path, e))?;

    doc.insert_image(page_id, stream, (rect.x, rect.y), (rect.width, rect.height))
        .map_err(|e| AppError::receipt_failed(pdf_path, e))?;
    doc.save(pdf_path)
        .map_err(|e| AppError::receipt_failed(pdf_path, e))?;
    Ok(())
}

/// 图片在页面上的位置（PDF 坐标，原点在左下角）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 计算图片位置：面积约为页面的 `coverage`，保持宽高比，
/// 水平居中，放在页面下半部分
pub fn placement(page: (f32, f32), image: (f32, f32), coverage: f32) -> Placement {
    let (page_w, page_h) = page;
    let (img_w, img_h) = (image.0.max(1.0), image.1.max(1.0));

    let mut scale = (coverage * page_w * page_h / (img_w * img_h)).sqrt();
    scale = scale.min(page_w / img_w).min(page_h / 2.0 / img_h);

    let width = img_w * scale;
    let height = img_h * scale;
    Placement {
        x: (page_w - width) / 2.0,
        y: (page_h / 2.0 - height) / 2.0,
        width,
        height,
    }
}

/// 读取页面尺寸，MediaBox 可能继承自父节点
fn page_size(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(media_box) = node.get(b"MediaBox").and_then(Object::as_array) {
            let nums: Vec<f32> = media_box.iter().filter_map(|o| o.as_float().ok()).collect();
            if let [x0, y0, x1, y1] = nums[..] {
                return Some((x1 - x0, y1 - y0));
            }
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}
