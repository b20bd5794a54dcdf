use axum::extract::{Extension, Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use weekrev_ai::prompt;
use weekrev_common::types::{ReportForm, ReviewMethod, ReviewReportRow, SaveReportRequest};
use weekrev_export::{export_pdf, export_word, Document};

use crate::api::{
    error_response, llm_error_response, storage_error_response, success_empty_response,
    success_response, ApiError,
};
use crate::logging::TraceId;
use crate::state::AppState;

/// 周报草稿生成请求（保存前由 LLM 起草）
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportBody {
    /// [start, end]，`YYYY-MM-DD`
    pub date_range: Vec<String>,
    #[serde(default)]
    pub selected_user_name: Option<String>,
    pub review_method: ReviewMethod,
    #[serde(flatten)]
    pub form: ReportForm,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportBody {
    pub ai_report: String,
}

/// 保存结果摘要（随完整报告行一并返回）
#[derive(Debug, serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    pub id: String,
    pub week_id: String,
    pub week_number: i32,
    pub year: i32,
    pub report: ReviewReportRow,
}

fn display_date_range(range: &[String]) -> String {
    range.join(" ~ ")
}

/// 保存周报：推导周桶、落库并重算该周统计。
#[utoipa::path(
    post,
    path = "/api/reports/save",
    tag = "Reports",
    request_body = SaveReportRequest,
    responses(
        (status = 200, description = "保存结果", body = SavedReport),
        (status = 400, description = "缺少必填字段或日期非法", body = ApiError),
        (status = 404, description = "用户不存在", body = ApiError)
    )
)]
async fn save_report(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<SaveReportRequest>,
) -> Response {
    let report = match state.store.save_report(&req).await {
        Ok(r) => r,
        Err(e) => return storage_error_response(&trace_id, e),
    };

    let year = match state.store.get_week(&report.week_id).await {
        Ok(Some(week)) => week.year,
        Ok(None) | Err(_) => {
            use chrono::Datelike;
            report.date_range_start.year()
        }
    };

    success_response(
        StatusCode::OK,
        &trace_id,
        SavedReport {
            id: report.id.clone(),
            week_id: report.week_id.clone(),
            week_number: report.week_number,
            year,
            report,
        },
    )
}

/// 阻塞式生成周报草稿：返回完整文本。
#[utoipa::path(
    post,
    path = "/api/reports/generate",
    tag = "Reports",
    request_body = GenerateReportBody,
    responses(
        (status = 200, description = "生成的报告文本"),
        (status = 502, description = "LLM 端点全部失败", body = ApiError)
    )
)]
async fn generate_report(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<GenerateReportBody>,
) -> Response {
    let user_name = req.selected_user_name.as_deref().unwrap_or("团队成员");
    let gen_req = prompt::build_report_request(
        user_name,
        &display_date_range(&req.date_range),
        req.review_method,
        &req.form,
        state.locale(),
    );

    match state.generator.generate(&gen_req).await {
        Ok(content) => success_response(StatusCode::OK, &trace_id, json!({ "content": content })),
        Err(e) => llm_error_response(&trace_id, e),
    }
}

/// 流式生成周报草稿。
///
/// `text/event-stream`，帧格式 `{type: status|content|complete|error}`。
/// 响应头已提交后出错时通过 `error` 帧上报；客户端断开即丢弃流，
/// 上游 LLM 请求随之取消。
#[utoipa::path(
    post,
    path = "/api/reports/generate-stream",
    tag = "Reports",
    request_body = GenerateReportBody,
    responses(
        (status = 200, description = "SSE 事件流", content_type = "text/event-stream")
    )
)]
async fn generate_report_stream(
    Extension(_trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<GenerateReportBody>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let generator = state.generator.clone();
    let locale = state.config.locale.clone();

    let stream = async_stream::stream! {
        yield Ok(frame(&json!({ "type": "status", "message": "generating" })));

        let user_name = req.selected_user_name.as_deref().unwrap_or("团队成员");
        let gen_req = prompt::build_report_request(
            user_name,
            &display_date_range(&req.date_range),
            req.review_method,
            &req.form,
            &locale,
        );

        match generator.generate_stream(&gen_req).await {
            Ok(mut chunks) => {
                let mut full = String::new();
                let mut failed = false;
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(content) => {
                            full.push_str(&content);
                            yield Ok(frame(&json!({ "type": "content", "content": content })));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "LLM stream failed mid-flight");
                            yield Ok(frame(&json!({ "type": "error", "error": e.to_string() })));
                            failed = true;
                            break;
                        }
                    }
                }
                if !failed {
                    yield Ok(frame(&json!({ "type": "complete", "content": full })));
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "LLM stream could not be opened");
                yield Ok(frame(&json!({ "type": "error", "error": e.to_string() })));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn frame(payload: &serde_json::Value) -> Event {
    Event::default().data(payload.to_string())
}

/// 更新报告正文。已锁定的报告返回 409。
#[utoipa::path(
    put,
    path = "/api/reports/update/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "报告 ID")),
    request_body = UpdateReportBody,
    responses(
        (status = 200, description = "更新后的报告", body = ReviewReportRow),
        (status = 404, description = "报告不存在", body = ApiError),
        (status = 409, description = "报告已锁定", body = ApiError)
    )
)]
async fn update_report(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReportBody>,
) -> Response {
    match state.store.update_report_content(&id, &req.ai_report).await {
        Ok(report) => success_response(StatusCode::OK, &trace_id, report),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 锁定报告：冻结内容并更新所属周的锁定计数。
#[utoipa::path(
    put,
    path = "/api/reports/lock/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "报告 ID")),
    responses(
        (status = 200, description = "锁定后的报告", body = ReviewReportRow),
        (status = 404, description = "报告不存在", body = ApiError)
    )
)]
async fn lock_report(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.lock_report(&id).await {
        Ok(report) => success_response(StatusCode::OK, &trace_id, report),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 解锁报告。
#[utoipa::path(
    put,
    path = "/api/reports/unlock/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "报告 ID")),
    responses(
        (status = 200, description = "解锁后的报告", body = ReviewReportRow),
        (status = 404, description = "报告不存在", body = ApiError)
    )
)]
async fn unlock_report(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.unlock_report(&id).await {
        Ok(report) => success_response(StatusCode::OK, &trace_id, report),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 删除报告并重算所属周的统计。
#[utoipa::path(
    delete,
    path = "/api/reports/delete/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "报告 ID")),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "报告不存在", body = ApiError)
    )
)]
async fn delete_report(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_report(&id).await {
        Ok(()) => success_empty_response(StatusCode::OK, &trace_id),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

// ---- 文档下载 ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Word,
    Pdf,
}

impl ExportFormat {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "word" | "docx" => Some(Self::Word),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

pub(crate) async fn convert_report(
    state: &AppState,
    title: &str,
    markdown: &str,
    format: ExportFormat,
) -> Result<Document, weekrev_export::ExportError> {
    match format {
        ExportFormat::Word => export_word(title, markdown, state.locale()).await,
        ExportFormat::Pdf => {
            export_pdf(title, markdown, state.locale(), &state.pdf_options).await
        }
    }
}

/// 附件响应。中文文件名走 RFC 5987 `filename*`，ASCII 兜底名按格式固定。
pub(crate) fn attachment_response(document: Document, base_name: &str) -> Response {
    let file_name = document.file_name(base_name);
    let encoded = urlencoding::encode(&file_name).into_owned();
    let fallback = format!("report.{}", document.kind.extension());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.kind.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"),
            ),
        ],
        document.bytes,
    )
        .into_response()
}

pub(crate) fn report_file_base(report: &ReviewReportRow) -> String {
    format!("{}_{}", report.user_name, report.date_range_end.format("%Y-%m-%d"))
}

async fn download_report(
    state: &AppState,
    trace_id: &str,
    id: &str,
    format: ExportFormat,
) -> Response {
    let (report, body) = match state.store.report_body(id).await {
        Ok(v) => v,
        Err(e) => return storage_error_response(trace_id, e),
    };

    let title = format!("{} {}", report.user_name, report.date_range_end.format("%Y-%m-%d"));
    match convert_report(state, &title, &body, format).await {
        Ok(document) => attachment_response(document, &report_file_base(&report)),
        Err(e) => crate::api::export_error_response(trace_id, e),
    }
}

/// 下载 Word 版周报。
#[utoipa::path(
    get,
    path = "/api/reports/download/word/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "报告 ID")),
    responses(
        (status = 200, description = "Word 附件（转换全部失败时退化为 HTML 附件）"),
        (status = 404, description = "报告不存在", body = ApiError)
    )
)]
async fn download_report_word(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    download_report(&state, &trace_id, &id, ExportFormat::Word).await
}

/// 下载 PDF 版周报。
#[utoipa::path(
    get,
    path = "/api/reports/download/pdf/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "报告 ID")),
    responses(
        (status = 200, description = "PDF 附件（转换全部失败时退化为 HTML 附件）"),
        (status = 404, description = "报告不存在", body = ApiError)
    )
)]
async fn download_report_pdf(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    download_report(&state, &trace_id, &id, ExportFormat::Pdf).await
}

pub(crate) fn bad_format_response(trace_id: &str, format: &str) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        trace_id,
        &format!("unsupported export format: {format}"),
    )
}

pub fn report_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(save_report))
        .routes(routes!(generate_report))
        .routes(routes!(generate_report_stream))
        .routes(routes!(update_report))
        .routes(routes!(lock_report))
        .routes(routes!(unlock_report))
        .routes(routes!(delete_report))
        .routes(routes!(download_report_word))
        .routes(routes!(download_report_pdf))
}
