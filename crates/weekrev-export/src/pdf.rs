use futures_util::FutureExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::error::ExportError;
use crate::fallback::{run_with_fallbacks, StrategyFn};
use crate::markdown::render_document;
use crate::{Document, DocumentKind};

/// PDF 转换工具配置。
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// 无头浏览器可执行文件（chromium / google-chrome）
    pub chromium_bin: String,
    /// wkhtmltopdf 可执行文件
    pub wkhtmltopdf_bin: String,
    /// 单个转换子进程的超时（秒）
    pub timeout_secs: u64,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            chromium_bin: "chromium".to_string(),
            wkhtmltopdf_bin: "wkhtmltopdf".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Markdown → PDF 文档。
///
/// 策略链：无头浏览器打印 → wkhtmltopdf → HTML 兜底文档。
/// 前两个策略各自在超时内运行外部工具，互不影响。
pub async fn export_pdf(
    title: &str,
    markdown: &str,
    locale: &str,
    opts: &PdfOptions,
) -> Result<Document, ExportError> {
    let html = render_document(title, markdown, locale);

    let work_dir = tempfile::tempdir()?;
    let html_path = work_dir.path().join("report.html");
    std::fs::write(&html_path, &html)?;

    let strategies: Vec<(&'static str, StrategyFn<'_, Document>)> = vec![
        ("chromium-headless", {
            let opts = opts.clone();
            let html_path = html_path.clone();
            let out_path = work_dir.path().join("chromium.pdf");
            Box::new(move || {
                async move {
                    chromium_pdf(&opts, &html_path, &out_path).await?;
                    read_pdf(&out_path)
                }
                .boxed()
            })
        }),
        ("wkhtmltopdf", {
            let opts = opts.clone();
            let html_path = html_path.clone();
            let out_path = work_dir.path().join("wkhtmltopdf.pdf");
            Box::new(move || {
                async move {
                    wkhtmltopdf(&opts, &html_path, &out_path).await?;
                    read_pdf(&out_path)
                }
                .boxed()
            })
        }),
        ("html-degraded", {
            let html = html.clone();
            Box::new(move || {
                async move {
                    Ok(Document {
                        kind: DocumentKind::Html,
                        bytes: html.into_bytes(),
                    })
                }
                .boxed()
            })
        }),
    ];

    run_with_fallbacks("pdf", strategies).await
}

async fn chromium_pdf(
    opts: &PdfOptions,
    html_path: &Path,
    out_path: &PathBuf,
) -> Result<(), ExportError> {
    let mut cmd = Command::new(&opts.chromium_bin);
    cmd.arg("--headless=new")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--no-pdf-header-footer")
        .arg(format!("--print-to-pdf={}", out_path.display()))
        .arg(html_path.as_os_str())
        .kill_on_drop(true);
    run_tool("chromium-headless", cmd, opts.timeout_secs).await
}

async fn wkhtmltopdf(
    opts: &PdfOptions,
    html_path: &Path,
    out_path: &PathBuf,
) -> Result<(), ExportError> {
    let mut cmd = Command::new(&opts.wkhtmltopdf_bin);
    cmd.arg("--quiet")
        .arg("--enable-local-file-access")
        .arg(html_path.as_os_str())
        .arg(out_path.as_os_str())
        .kill_on_drop(true);
    run_tool("wkhtmltopdf", cmd, opts.timeout_secs).await
}

/// 在超时内运行一个转换子进程；超时或非零退出码都算该策略失败。
async fn run_tool(
    strategy: &'static str,
    mut cmd: Command,
    timeout_secs: u64,
) -> Result<(), ExportError> {
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), async {
        cmd.output().await
    })
    .await
    .map_err(|_| ExportError::Strategy {
        strategy,
        message: format!("timed out after {timeout_secs}s"),
    })?
    .map_err(|e| ExportError::Strategy {
        strategy,
        message: format!("failed to spawn: {e}"),
    })?;

    if !output.status.success() {
        return Err(ExportError::Strategy {
            strategy,
            message: format!(
                "exit status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

fn read_pdf(path: &Path) -> Result<Document, ExportError> {
    let bytes = std::fs::read(path).map_err(|e| ExportError::Strategy {
        strategy: "pdf-read",
        message: format!("output file missing: {e}"),
    })?;
    if !bytes.starts_with(b"%PDF") {
        return Err(ExportError::Strategy {
            strategy: "pdf-read",
            message: "output is not a PDF document".to_string(),
        });
    }
    Ok(Document {
        kind: DocumentKind::Pdf,
        bytes,
    })
}
