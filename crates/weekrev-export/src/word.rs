use docx_rs::{AlignmentType, Docx, Paragraph, Run};
use futures_util::FutureExt;
use std::io::Cursor;

use crate::error::ExportError;
use crate::fallback::{run_with_fallbacks, StrategyFn};
use crate::markdown::render_document;
use crate::{Document, DocumentKind};

/// Markdown → Word 文档。
///
/// 策略链：结构化 docx 构建 → 纯段落 docx → HTML 兜底文档。
pub async fn export_word(title: &str, markdown: &str, locale: &str) -> Result<Document, ExportError> {
    let strategies: Vec<(&'static str, StrategyFn<'_, Document>)> = vec![
        ("docx-structured", {
            let title = title.to_string();
            let markdown = markdown.to_string();
            Box::new(move || {
                async move {
                    structured_docx(&title, &markdown).map(|bytes| Document {
                        kind: DocumentKind::Docx,
                        bytes,
                    })
                }
                .boxed()
            })
        }),
        ("docx-plain", {
            let title = title.to_string();
            let markdown = markdown.to_string();
            Box::new(move || {
                async move {
                    plain_docx(&title, &markdown).map(|bytes| Document {
                        kind: DocumentKind::Docx,
                        bytes,
                    })
                }
                .boxed()
            })
        }),
        ("html-degraded", {
            let title = title.to_string();
            let markdown = markdown.to_string();
            let locale = locale.to_string();
            Box::new(move || {
                async move {
                    Ok(Document {
                        kind: DocumentKind::Html,
                        bytes: render_document(&title, &markdown, &locale).into_bytes(),
                    })
                }
                .boxed()
            })
        }),
    ];

    run_with_fallbacks("word", strategies).await
}

/// 逐行解析 Markdown 的轻量 docx 构建：标题、列表、表格行、普通段落。
fn structured_docx(title: &str, markdown: &str) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new();

    let title_para = Paragraph::new()
        .add_run(Run::new().add_text(title).bold().size(32))
        .align(AlignmentType::Center);
    docx = docx.add_paragraph(title_para);

    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let para = if let Some(text) = trimmed.strip_prefix("### ") {
            Paragraph::new().add_run(Run::new().add_text(strip_inline(text)).bold().size(24))
        } else if let Some(text) = trimmed.strip_prefix("## ") {
            Paragraph::new().add_run(Run::new().add_text(strip_inline(text)).bold().size(26))
        } else if let Some(text) = trimmed.strip_prefix("# ") {
            Paragraph::new().add_run(Run::new().add_text(strip_inline(text)).bold().size(28))
        } else if let Some(text) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* "))
        {
            Paragraph::new().add_run(Run::new().add_text(format!("• {}", strip_inline(text))))
        } else if trimmed.starts_with('|') {
            // 表格分隔行丢弃，数据行以制表符分列呈现
            if is_table_separator(trimmed) {
                continue;
            }
            let cells: Vec<String> = trimmed
                .trim_matches('|')
                .split('|')
                .map(|c| strip_inline(c.trim()))
                .collect();
            Paragraph::new().add_run(Run::new().add_text(cells.join("\t")))
        } else {
            Paragraph::new().add_run(Run::new().add_text(strip_inline(trimmed)))
        };
        docx = docx.add_paragraph(para);
    }

    pack_docx(docx)
}

/// 极简构建：标题 + 按空行切分的纯文本段落，牺牲格式换取成功率。
fn plain_docx(title: &str, markdown: &str) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new();

    let title_para = Paragraph::new()
        .add_run(Run::new().add_text(title).bold())
        .align(AlignmentType::Center);
    docx = docx.add_paragraph(title_para);

    for para_text in markdown.split("\n\n") {
        if !para_text.trim().is_empty() {
            let para = Paragraph::new().add_run(Run::new().add_text(para_text.trim()));
            docx = docx.add_paragraph(para);
        }
    }

    pack_docx(docx)
}

fn pack_docx(docx: Docx) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    docx.build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| ExportError::Strategy {
            strategy: "docx-pack",
            message: e.to_string(),
        })?;
    Ok(buffer)
}

fn is_table_separator(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// 去掉行内加粗/斜体/行内代码标记，保留纯文本。
fn strip_inline(text: &str) -> String {
    text.replace("**", "").replace('`', "").replace('*', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# 周报\n\n## 总结\n\n- 完成客户拜访\n\n| 任务 | 结果 |\n|------|------|\n| 签约 | 完成 |\n";

    #[test]
    fn test_structured_docx_produces_zip_container() {
        let bytes = structured_docx("张三的周报", SAMPLE).expect("build should succeed");
        // OOXML 是 zip 容器
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_plain_docx_produces_zip_container() {
        let bytes = plain_docx("张三的周报", SAMPLE).expect("build should succeed");
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_table_separator_detection() {
        assert!(is_table_separator("|------|------|"));
        assert!(is_table_separator("| :--- | ---: |"));
        assert!(!is_table_separator("| 任务 | 结果 |"));
    }

    #[tokio::test]
    async fn test_export_word_returns_docx() {
        let doc = export_word("周报", SAMPLE, "zh-CN")
            .await
            .expect("export should succeed");
        assert_eq!(doc.kind, DocumentKind::Docx);
        assert_eq!(doc.file_name("weekly"), "weekly.docx");
    }
}
