use pulldown_cmark::{html, Options, Parser};

/// 将 Markdown 转换为 HTML 片段。
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

/// 渲染完整的 HTML 文档（打印样式内联，供 PDF 转换与兜底下载共用）。
pub fn render_document(title: &str, markdown: &str, locale: &str) -> String {
    let template = include_str!("templates/report.html");
    let content = markdown_to_html(markdown);

    template
        .replace("{{lang}}", if locale == "zh-CN" { "zh" } else { "en" })
        .replace("{{title}}", &escape_html(title))
        .replace("{{content}}", &content)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
