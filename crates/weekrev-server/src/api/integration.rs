use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use weekrev_ai::prompt;
use weekrev_common::types::IntegrationReportRow;
use weekrev_storage::store::integration::NewIntegrationReport;

use crate::api::reports::{attachment_response, bad_format_response, convert_report, ExportFormat};
use crate::api::{
    error_response, export_error_response, llm_error_response, storage_error_response,
    success_empty_response, success_response, ApiError,
};
use crate::logging::TraceId;
use crate::state::AppState;

/// 整合报告生成请求
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIntegrationBody {
    /// 参与整合的报告 ID；缺省为该周全部报告
    #[serde(default)]
    pub report_ids: Vec<String>,
}

/// 生成一周的 AI 整合报告。
///
/// 把该周（选中的）个人周报合并成一份团队报告，由第二次 LLM 调用生成；
/// 旧的整合报告被替换。
#[utoipa::path(
    post,
    path = "/api/weeks/{week_id}/integration",
    tag = "Integration",
    params(("week_id" = String, Path, description = "周 ID")),
    request_body = GenerateIntegrationBody,
    responses(
        (status = 200, description = "生成的整合报告", body = IntegrationReportRow),
        (status = 400, description = "该周没有可整合的报告", body = ApiError),
        (status = 404, description = "周不存在", body = ApiError),
        (status = 502, description = "LLM 端点全部失败", body = ApiError)
    )
)]
async fn generate_integration(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(week_id): Path<String>,
    Json(req): Json<GenerateIntegrationBody>,
) -> Response {
    let week = match state.store.get_week(&week_id).await {
        Ok(Some(w)) => w,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                &format!("week '{week_id}' not found"),
            )
        }
        Err(e) => return storage_error_response(&trace_id, e),
    };

    let mut reports = match state.store.list_reports_by_week(&week_id).await {
        Ok(reports) => reports,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    if !req.report_ids.is_empty() {
        reports.retain(|r| req.report_ids.contains(&r.id));
    }
    if reports.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "no reports available for integration",
        );
    }

    // 正文取磁盘镜像（数据库列兜底）
    let mut inputs = Vec::with_capacity(reports.len());
    for report in &reports {
        let body = match state.store.report_body(&report.id).await {
            Ok((_, body)) => body,
            Err(e) => return storage_error_response(&trace_id, e),
        };
        inputs.push((report.user_name.clone(), body));
    }

    let date_range = format!(
        "{} ~ {}",
        week.date_range_start.format("%Y-%m-%d"),
        week.date_range_end.format("%Y-%m-%d")
    );
    let gen_req = prompt::build_integration_request(&inputs, &date_range, state.locale());

    let content = match state.generator.generate(&gen_req).await {
        Ok(content) => content,
        Err(e) => return llm_error_response(&trace_id, e),
    };

    let user_names = inputs
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join("、");

    match state
        .store
        .save_integration_report(&NewIntegrationReport {
            week_id: week.id.clone(),
            week_number: week.week_number,
            date_range,
            user_names,
            report_content: content,
        })
        .await
    {
        Ok(report) => success_response(StatusCode::OK, &trace_id, report),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 某周最新的整合报告。
#[utoipa::path(
    get,
    path = "/api/weeks/{week_id}/integration",
    tag = "Integration",
    params(("week_id" = String, Path, description = "周 ID")),
    responses(
        (status = 200, description = "整合报告", body = IntegrationReportRow),
        (status = 404, description = "该周还没有整合报告", body = ApiError)
    )
)]
async fn get_integration(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(week_id): Path<String>,
) -> Response {
    match state.store.latest_integration_for_week(&week_id).await {
        Ok(Some(report)) => success_response(StatusCode::OK, &trace_id, report),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            &format!("no integration report for week '{week_id}'"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 删除整合报告。
#[utoipa::path(
    delete,
    path = "/api/integration/{id}",
    tag = "Integration",
    params(("id" = String, Path, description = "整合报告 ID")),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "整合报告不存在", body = ApiError)
    )
)]
async fn delete_integration(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.delete_integration_report(&id).await {
        Ok(()) => success_empty_response(StatusCode::OK, &trace_id),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 下载整合报告（word | pdf）。
#[utoipa::path(
    get,
    path = "/api/integration/download/{format}/{id}",
    tag = "Integration",
    params(
        ("format" = String, Path, description = "导出格式（word | pdf）"),
        ("id" = String, Path, description = "整合报告 ID")
    ),
    responses(
        (status = 200, description = "文档附件"),
        (status = 400, description = "格式不支持", body = ApiError),
        (status = 404, description = "整合报告不存在", body = ApiError)
    )
)]
async fn download_integration(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path((format, id)): Path<(String, String)>,
) -> Response {
    let Some(format) = ExportFormat::parse(&format) else {
        return bad_format_response(&trace_id, &format);
    };

    let (report, body) = match state.store.integration_body(&id).await {
        Ok(v) => v,
        Err(e) => return storage_error_response(&trace_id, e),
    };

    let title = format!("团队周报 {}", report.date_range);
    let base_name = format!("team_week_{}", report.week_number);
    match convert_report(&state, &title, &body, format).await {
        Ok(document) => attachment_response(document, &base_name),
        Err(e) => export_error_response(&trace_id, e),
    }
}

pub fn integration_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(generate_integration, get_integration))
        .routes(routes!(delete_integration))
        .routes(routes!(download_integration))
}
