pub mod integration;
pub mod reports;
pub mod users;
pub mod weeks;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use weekrev_ai::LlmError;
use weekrev_export::ExportError;
use weekrev_storage::StorageError;

/// API 错误响应
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// 恒为 false
    pub success: bool,
    /// 错误信息
    pub error: String,
    /// 链路追踪 ID
    pub trace_id: String,
}

/// API 统一响应包裹
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// 是否成功
    pub success: bool,
    /// 错误信息（成功时省略）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 链路追踪 ID
    pub trace_id: String,
    /// 列表总数（仅列表响应携带）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// 业务数据
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            success: true,
            error: None,
            trace_id: trace_id.to_string(),
            count: None,
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn success_list_response<T>(status: StatusCode, trace_id: &str, items: Vec<T>) -> Response
where
    T: Serialize,
{
    let count = items.len() as u64;
    (
        status,
        Json(ApiResponse {
            success: true,
            error: None,
            trace_id: trace_id.to_string(),
            count: Some(count),
            data: Some(items),
        }),
    )
        .into_response()
}

pub fn success_empty_response(status: StatusCode, trace_id: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            success: true,
            error: None,
            trace_id: trace_id.to_string(),
            count: None,
            data: None,
        }),
    )
        .into_response()
}

pub fn error_response(status: StatusCode, trace_id: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            success: false,
            error: Some(msg.to_string()),
            trace_id: trace_id.to_string(),
            count: None,
            data: None,
        }),
    )
        .into_response()
}

/// 持久层错误到 HTTP 状态的统一映射。
pub(crate) fn storage_error_response(trace_id: &str, err: StorageError) -> Response {
    let status = match &err {
        StorageError::Validation(_) | StorageError::Week(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
        StorageError::Conflict(_) | StorageError::Locked { .. } => StatusCode::CONFLICT,
        StorageError::Db(_) | StorageError::Json(_) | StorageError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "Storage operation failed");
    }
    error_response(status, trace_id, &err.to_string())
}

/// LLM 错误统一映射为 502。
pub(crate) fn llm_error_response(trace_id: &str, err: LlmError) -> Response {
    tracing::error!(error = %err, "LLM generation failed");
    error_response(StatusCode::BAD_GATEWAY, trace_id, &err.to_string())
}

/// 导出错误统一映射为 500。
pub(crate) fn export_error_response(trace_id: &str, err: ExportError) -> Response {
    tracing::error!(error = %err, "Document export failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, trace_id, &err.to_string())
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// 服务版本号
    version: String,
    /// 运行时长（秒）
    uptime_secs: i64,
    /// 存储状态
    storage_status: String,
}

/// 获取服务健康状态。
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "服务健康状态", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            storage_status: "ok".to_string(),
        },
    )
}

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(users::user_routes())
        .merge(weeks::week_routes())
        .merge(reports::report_routes())
        .merge(integration::integration_routes())
}
