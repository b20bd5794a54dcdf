use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use weekrev_common::types::{ReviewReportRow, WeekRow};

use crate::api::reports::{
    attachment_response, bad_format_response, convert_report, report_file_base, ExportFormat,
};
use crate::api::{
    error_response, export_error_response, storage_error_response, success_list_response,
    success_response, ApiError,
};
use crate::logging::TraceId;
use crate::state::AppState;

/// 周详情：周桶 + 该周全部周报
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct WeekDetail {
    pub week: WeekRow,
    pub reports: Vec<ReviewReportRow>,
}

/// 周列表，年份、周次倒序。
#[utoipa::path(
    get,
    path = "/api/weeks",
    tag = "Weeks",
    responses(
        (status = 200, description = "周列表", body = Vec<WeekRow>)
    )
)]
async fn list_weeks(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> Response {
    match state.store.list_weeks().await {
        Ok(weeks) => success_list_response(StatusCode::OK, &trace_id, weeks),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 周详情（周桶与该周全部周报，周报按创建时间倒序）。
#[utoipa::path(
    get,
    path = "/api/weeks/{week_id}",
    tag = "Weeks",
    params(("week_id" = String, Path, description = "周 ID")),
    responses(
        (status = 200, description = "周详情", body = WeekDetail),
        (status = 404, description = "周不存在", body = ApiError)
    )
)]
async fn get_week(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(week_id): Path<String>,
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

    match state.store.list_reports_by_week(&week_id).await {
        Ok(reports) => success_response(StatusCode::OK, &trace_id, WeekDetail { week, reports }),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchDownloadQuery {
    /// 逗号分隔的报告 ID 列表；缺省为该周全部报告
    #[param(required = false)]
    #[serde(rename = "reportIds")]
    pub report_ids: Option<String>,
}

/// 批量下载一周的周报。
///
/// 单份直接返回文档附件，多份打包为 zip。
#[utoipa::path(
    get,
    path = "/api/weeks/{week_id}/download/{format}",
    tag = "Weeks",
    params(
        ("week_id" = String, Path, description = "周 ID"),
        ("format" = String, Path, description = "导出格式（word | pdf）"),
        BatchDownloadQuery
    ),
    responses(
        (status = 200, description = "文档附件或 zip 归档"),
        (status = 400, description = "格式不支持或选择为空", body = ApiError),
        (status = 404, description = "周不存在", body = ApiError)
    )
)]
async fn download_week_reports(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path((week_id, format)): Path<(String, String)>,
    Query(query): Query<BatchDownloadQuery>,
) -> Response {
    let Some(format) = ExportFormat::parse(&format) else {
        return bad_format_response(&trace_id, &format);
    };

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

    if let Some(ids) = &query.report_ids {
        let selected: HashSet<&str> = ids.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        reports.retain(|r| selected.contains(r.id.as_str()));
    }
    if reports.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "no reports selected for download",
        );
    }

    // 单份直接给文档，多份打 zip
    if reports.len() == 1 {
        let report = &reports[0];
        let body = match state.store.report_body(&report.id).await {
            Ok((_, body)) => body,
            Err(e) => return storage_error_response(&trace_id, e),
        };
        let title = format!(
            "{} {}",
            report.user_name,
            report.date_range_end.format("%Y-%m-%d")
        );
        return match convert_report(&state, &title, &body, format).await {
            Ok(document) => attachment_response(document, &report_file_base(report)),
            Err(e) => export_error_response(&trace_id, e),
        };
    }

    let mut entries = Vec::with_capacity(reports.len());
    let mut used_names: HashSet<String> = HashSet::new();
    for report in &reports {
        let body = match state.store.report_body(&report.id).await {
            Ok((_, body)) => body,
            Err(e) => return storage_error_response(&trace_id, e),
        };
        let title = format!(
            "{} {}",
            report.user_name,
            report.date_range_end.format("%Y-%m-%d")
        );
        let document = match convert_report(&state, &title, &body, format).await {
            Ok(d) => d,
            Err(e) => return export_error_response(&trace_id, e),
        };

        let mut name = document.file_name(&report_file_base(report));
        let mut suffix = 2;
        while !used_names.insert(name.clone()) {
            name = document.file_name(&format!("{}_{suffix}", report_file_base(report)));
            suffix += 1;
        }
        entries.push((name, document.bytes));
    }

    let bytes = match weekrev_export::bundle_zip(&entries) {
        Ok(bytes) => bytes,
        Err(e) => return export_error_response(&trace_id, e),
    };

    let file_name = format!("week_{}_{}_reports.zip", week.year, week.week_number);
    let encoded = urlencoding::encode(&file_name).into_owned();
    use axum::http::header;
    use axum::response::IntoResponse;
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"reports.zip\"; filename*=UTF-8''{encoded}"),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub fn week_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_weeks))
        .routes(routes!(get_week))
        .routes(routes!(download_week_reports))
}
