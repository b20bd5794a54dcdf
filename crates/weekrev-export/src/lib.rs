//! 报告文档导出：Markdown → HTML → Word / PDF，以及批量下载的 zip 打包。
//!
//! 每种目标格式都有一条固定顺序的转换策略链（[`fallback::run_with_fallbacks`]），
//! 逐个尝试，首个成功者胜出；全部失败时 PDF/Word 退化为 HTML 文档兜底。

pub mod archive;
pub mod error;
pub mod fallback;
pub mod markdown;
pub mod pdf;
pub mod word;

pub use archive::bundle_zip;
pub use error::ExportError;
pub use pdf::{export_pdf, PdfOptions};
pub use word::export_word;

/// 导出产物的实际格式。
///
/// 策略链可能退化：请求 PDF/Word 但全部转换失败时，返回 HTML 兜底文档，
/// 调用方按 `kind` 设置响应头。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Html,
}

impl DocumentKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Html => "text/html; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Html => "html",
        }
    }
}

/// 一份导出完成的文档。
pub struct Document {
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn file_name(&self, base: &str) -> String {
        format!("{base}.{}", self.kind.extension())
    }
}
