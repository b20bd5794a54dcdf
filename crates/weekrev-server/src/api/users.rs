use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use weekrev_common::types::UserRow;

use crate::api::{
    storage_error_response, success_empty_response, success_list_response, success_response,
    ApiError,
};
use crate::logging::TraceId;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
}

/// 用户列表（管理端维护，周报保存时引用）。
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "用户列表", body = Vec<UserRow>)
    )
)]
async fn list_users(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> Response {
    match state.store.list_users().await {
        Ok(users) => success_list_response(StatusCode::OK, &trace_id, users),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 创建用户。名称唯一，重名返回 409。
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "创建的用户", body = UserRow),
        (status = 400, description = "名称为空", body = ApiError),
        (status = 409, description = "名称重复", body = ApiError)
    )
)]
async fn create_user(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    match state.store.create_user(&req.name).await {
        Ok(user) => success_response(StatusCode::OK, &trace_id, user),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// 删除用户。级联删除其全部周报并重算受影响周的统计。
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "用户 ID")
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "用户不存在", body = ApiError)
    )
)]
async fn delete_user(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_user(&id).await {
        Ok(()) => success_empty_response(StatusCode::OK, &trace_id),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(delete_user))
}
