//! 用假的外部能力跑完整流水线

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use robot_order_submit::models::Order;
use robot_order_submit::services::{
    Archiver, FeedDownloader, OrderSite, ReceiptMerger, ReceiptRenderer, ZipArchiver,
};
use robot_order_submit::{AppError, AppResult, Capabilities, Config, Pipeline};
use tokio_test::{assert_err, assert_ok};

type Events = Arc<Mutex<Vec<String>>>;

fn record(events: &Events, event: impl Into<String>) {
    events.lock().expect("events lock").push(event.into());
}

// ========== 假实现 ==========

struct RecordingSite {
    events: Events,
    /// 每个订单前几次提交失败
    failures_before_success: u32,
    /// 永远不出现"再来一单"
    never_confirm: bool,
    /// 提交已生效，但按钮在提交返回后才出现
    late_confirm: bool,
    pending_failures: Mutex<u32>,
    confirmed: Mutex<bool>,
    current: Mutex<Option<u32>>,
}

impl RecordingSite {
    fn new(events: Events) -> Self {
        Self {
            events,
            failures_before_success: 0,
            never_confirm: false,
            late_confirm: false,
            pending_failures: Mutex::new(0),
            confirmed: Mutex::new(false),
            current: Mutex::new(None),
        }
    }
}

#[async_trait]
impl OrderSite for RecordingSite {
    async fn open(&self) -> AppResult<()> {
        record(&self.events, "open");
        Ok(())
    }

    async fn fill_order(&self, order: &Order) -> AppResult<()> {
        record(
            &self.events,
            format!("fill:{}:{}", order.order_number, order.head.label()),
        );
        *self.current.lock().unwrap() = Some(order.order_number);
        *self.pending_failures.lock().unwrap() = self.failures_before_success;
        *self.confirmed.lock().unwrap() = false;
        Ok(())
    }

    async fn submit(&self) -> AppResult<bool> {
        record(&self.events, "submit");
        if self.never_confirm {
            return Ok(false);
        }
        let mut pending = self.pending_failures.lock().unwrap();
        if *pending > 0 {
            *pending -= 1;
            return Ok(false);
        }
        *self.confirmed.lock().unwrap() = true;
        Ok(!self.late_confirm)
    }

    async fn is_confirmed(&self) -> AppResult<bool> {
        record(&self.events, "is_confirmed");
        Ok(*self.confirmed.lock().unwrap())
    }

    async fn receipt_html(&self) -> AppResult<String> {
        let number = self.current.lock().unwrap().unwrap_or_default();
        Ok(format!("<p>Receipt {}</p>", number))
    }

    async fn capture_preview(&self, path: &Path) -> AppResult<()> {
        record(&self.events, "screenshot");
        std::fs::write(path, b"\x89PNG fake")?;
        Ok(())
    }

    async fn order_another(&self) -> AppResult<()> {
        record(&self.events, "order_another");
        Ok(())
    }
}

struct FixedFeed {
    csv: String,
    events: Events,
}

#[async_trait]
impl FeedDownloader for FixedFeed {
    async fn download(&self, url: &str, dest: &Path) -> AppResult<u64> {
        record(&self.events, format!("download:{}", url));
        std::fs::write(dest, &self.csv)?;
        Ok(self.csv.len() as u64)
    }
}

struct HtmlAsPdf {
    events: Events,
}

#[async_trait]
impl ReceiptRenderer for HtmlAsPdf {
    async fn render_pdf(&self, html: &str, path: &Path) -> AppResult<()> {
        record(&self.events, "render");
        std::fs::write(path, format!("%PDF {}", html))?;
        Ok(())
    }
}

struct AppendingMerger {
    events: Events,
}

#[async_trait]
impl ReceiptMerger for AppendingMerger {
    async fn embed_image(&self, image: &Path, pdf: &Path) -> AppResult<()> {
        record(&self.events, "merge");
        let mut content = std::fs::read(pdf)?;
        content.extend(std::fs::read(image)?);
        std::fs::write(pdf, content)?;
        Ok(())
    }
}

/// 打包前记录回执目录中的文件名
struct SnapshotArchiver {
    inner: ZipArchiver,
    events: Events,
    seen: Arc<Mutex<BTreeSet<String>>>,
    screenshots: Arc<Mutex<BTreeSet<String>>>,
    screenshots_dir: PathBuf,
}

#[async_trait]
impl Archiver for SnapshotArchiver {
    async fn archive_dir(&self, source_dir: &Path, archive_path: &Path) -> AppResult<usize> {
        record(&self.events, "archive");
        *self.seen.lock().unwrap() = list_dir(source_dir);
        *self.screenshots.lock().unwrap() = list_dir(&self.screenshots_dir);
        self.inner.archive_dir(source_dir, archive_path).await
    }
}

fn list_dir(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

// ========== 测试环境 ==========

struct Harness {
    _tmp: tempfile::TempDir,
    config: Config,
    events: Events,
    before_archive: Arc<Mutex<BTreeSet<String>>>,
    screenshots_before_archive: Arc<Mutex<BTreeSet<String>>>,
}

impl Harness {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            orders_csv_path: tmp.path().join("orders.csv").to_string_lossy().into_owned(),
            output_dir: tmp.path().join("output").to_string_lossy().into_owned(),
            submit_max_attempts: 3,
            submit_backoff_ms: 0,
            submit_backoff_max_ms: 0,
            ..Config::default()
        };
        Self {
            _tmp: tmp,
            config,
            events: Arc::new(Mutex::new(Vec::new())),
            before_archive: Arc::new(Mutex::new(BTreeSet::new())),
            screenshots_before_archive: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    fn pipeline(&self, csv: &str, site: RecordingSite) -> Pipeline {
        let caps = Capabilities {
            site: Arc::new(site),
            downloader: Arc::new(FixedFeed {
                csv: csv.to_string(),
                events: self.events.clone(),
            }),
            renderer: Arc::new(HtmlAsPdf {
                events: self.events.clone(),
            }),
            merger: Arc::new(AppendingMerger {
                events: self.events.clone(),
            }),
            archiver: Arc::new(SnapshotArchiver {
                inner: ZipArchiver::new(),
                events: self.events.clone(),
                seen: self.before_archive.clone(),
                screenshots: self.screenshots_before_archive.clone(),
                screenshots_dir: self.config.screenshots_dir(),
            }),
        };
        Pipeline::new(self.config.clone(), caps)
    }

    fn site(&self) -> RecordingSite {
        RecordingSite::new(self.events.clone())
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn archive_entries(&self) -> BTreeSet<String> {
        let archive =
            zip::ZipArchive::new(File::open(self.config.archive_path()).unwrap()).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }
}

const HEADER: &str = "Order number,Head,Body,Legs,Address\n";

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ========== 测试 ==========

#[tokio::test]
async fn single_order_produces_archive_and_cleans_up() {
    let h = Harness::new();
    let csv = format!("{}1,2,3,the-legs,123 Main St\n", HEADER);

    let summary = assert_ok!(h.pipeline(&csv, h.site()).run().await);

    assert_eq!(summary.orders, 1);
    assert_eq!(summary.archived, 1);
    assert_eq!(summary.archive_path, h.config.archive_path());
    assert!(h.config.archive_path().exists());
    assert_eq!(h.archive_entries(), set(&["1.pdf"]));
    assert!(!h.config.receipts_dir().exists());
    assert!(!h.config.screenshots_dir().exists());
}

#[tokio::test]
async fn stages_run_in_order() {
    let h = Harness::new();
    let csv = format!("{}1,2,3,the-legs,123 Main St\n", HEADER);

    assert_ok!(h.pipeline(&csv, h.site()).run().await);

    assert_eq!(
        h.events(),
        vec![
            "open".to_string(),
            format!("download:{}", h.config.orders_csv_url),
            "fill:1:Peanut crusher head".to_string(),
            "submit".to_string(),
            "render".to_string(),
            "screenshot".to_string(),
            "merge".to_string(),
            "order_another".to_string(),
            "archive".to_string(),
        ]
    );
}

#[tokio::test]
async fn n_orders_produce_n_receipts_and_screenshots() {
    let h = Harness::new();
    let csv = format!(
        "{}5,1,1,a,Addr 5\n3,6,2,b,Addr 3\n8,4,6,c,\"Addr, 8\"\n",
        HEADER
    );

    let summary = assert_ok!(h.pipeline(&csv, h.site()).run().await);

    assert_eq!(summary.orders, 3);
    let expected = set(&["3.pdf", "5.pdf", "8.pdf"]);
    assert_eq!(*h.before_archive.lock().unwrap(), expected);
    assert_eq!(
        *h.screenshots_before_archive.lock().unwrap(),
        set(&["3.png", "5.png", "8.png"])
    );
    assert_eq!(h.archive_entries(), expected);

    let fills: Vec<String> = h
        .events()
        .into_iter()
        .filter(|e| e.starts_with("fill:"))
        .collect();
    assert_eq!(
        fills,
        vec![
            "fill:5:Roll-a-thor head",
            "fill:3:Drillbit 2000 head",
            "fill:8:Andy Roid head",
        ]
    );
}

#[tokio::test]
async fn unknown_head_aborts_before_any_receipt() {
    let h = Harness::new();
    let csv = format!("{}1,2,3,the-legs,123 Main St\n2,9,1,x,y\n", HEADER);

    let err = assert_err!(h.pipeline(&csv, h.site()).run().await);

    assert!(matches!(err, AppError::Feed(_)));
    assert!(!h.config.archive_path().exists());
    assert!(!h.config.receipts_dir().exists());
    assert!(!h.events().iter().any(|e| e.starts_with("fill:") || e == "render"));
}

#[tokio::test]
async fn submit_retries_until_confirmed() {
    let h = Harness::new();
    let csv = format!("{}1,2,3,the-legs,123 Main St\n2,1,1,x,y\n", HEADER);
    let mut site = h.site();
    site.failures_before_success = 2;

    let summary = assert_ok!(h.pipeline(&csv, site).run().await);

    assert_eq!(summary.orders, 2);
    assert_eq!(summary.submit_attempts, 6);
    let submits = h.events().iter().filter(|e| *e == "submit").count();
    assert_eq!(submits, 6);
}

#[tokio::test]
async fn late_confirmation_is_not_submitted_again() {
    let h = Harness::new();
    let csv = format!("{}1,2,3,the-legs,123 Main St\n2,1,1,x,y\n", HEADER);
    let mut site = h.site();
    site.late_confirm = true;

    let summary = assert_ok!(h.pipeline(&csv, site).run().await);

    assert_eq!(summary.orders, 2);
    assert_eq!(summary.submit_attempts, 2);
    let events = h.events();
    let submits = events.iter().filter(|e| *e == "submit").count();
    assert_eq!(submits, 2);
    let checks = events.iter().filter(|e| *e == "is_confirmed").count();
    assert_eq!(checks, 2);
    assert_eq!(summary.archived, 2);
}

#[tokio::test]
async fn submit_exhaustion_aborts_and_cleans_up() {
    let h = Harness::new();
    let csv = format!("{}1,2,3,the-legs,123 Main St\n", HEADER);
    let mut site = h.site();
    site.never_confirm = true;

    let err = assert_err!(h.pipeline(&csv, site).run().await);

    match err {
        AppError::SubmitExhausted {
            order_number,
            attempts,
        } => {
            assert_eq!(order_number, 1);
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!h.config.archive_path().exists());
    assert!(!h.config.receipts_dir().exists());
    assert!(!h.config.screenshots_dir().exists());
}

#[tokio::test]
async fn failure_preserves_artifacts_when_configured() {
    let mut h = Harness::new();
    h.config.preserve_artifacts_on_failure = true;
    let csv = format!("{}1,2,3,the-legs,123 Main St\n2,1,1,x,y\n", HEADER);

    struct FailingArchiver;

    #[async_trait]
    impl Archiver for FailingArchiver {
        async fn archive_dir(&self, source_dir: &Path, _archive_path: &Path) -> AppResult<usize> {
            Err(AppError::archive_failed(source_dir, "disk full"))
        }
    }

    let caps = Capabilities {
        site: Arc::new(h.site()),
        downloader: Arc::new(FixedFeed {
            csv,
            events: h.events.clone(),
        }),
        renderer: Arc::new(HtmlAsPdf {
            events: h.events.clone(),
        }),
        merger: Arc::new(AppendingMerger {
            events: h.events.clone(),
        }),
        archiver: Arc::new(FailingArchiver),
    };

    let err = assert_err!(Pipeline::new(h.config.clone(), caps).run().await);

    assert!(matches!(err, AppError::Archive { .. }));
    assert!(h.config.receipts_dir().join("1.pdf").exists());
    assert!(h.config.receipts_dir().join("2.pdf").exists());
    assert!(h.config.screenshots_dir().join("2.png").exists());
}

#[tokio::test]
async fn rerun_overwrites_previous_archive() {
    let h = Harness::new();
    let first = format!("{}1,2,3,a,b\n2,2,3,a,b\n", HEADER);
    let second = format!("{}7,2,3,a,b\n", HEADER);

    assert_ok!(h.pipeline(&first, h.site()).run().await);
    assert_eq!(h.archive_entries(), set(&["1.pdf", "2.pdf"]));

    assert_ok!(h.pipeline(&second, h.site()).run().await);
    assert_eq!(h.archive_entries(), set(&["7.pdf"]));
}
