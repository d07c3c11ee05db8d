pub mod archiver;
pub mod feed_downloader;
pub mod order_site;
pub mod receipt_merger;
pub mod receipt_renderer;

pub use archiver::{Archiver, ZipArchiver};
pub use feed_downloader::{FeedDownloader, HttpDownloader};
pub use order_site::{OrderSite, RobotSpareBinSite, SiteSelectors};
pub use receipt_merger::{LopdfMerger, ReceiptMerger};
pub use receipt_renderer::{ChromePdfRenderer, ReceiptRenderer};
