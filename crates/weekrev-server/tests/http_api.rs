mod common;

use axum::http::StatusCode;
use common::{
    assert_err_envelope, assert_ok_envelope, build_test_context, build_test_context_with_llm,
    create_user, request_json, request_no_body, request_raw, request_raw_with_body,
    save_minimal_report, LLM_OK_BODY,
};
use serde_json::json;

#[tokio::test]
async fn health_should_return_ok_envelope() {
    let ctx = build_test_context().await.expect("test context should build");
    let (status, body, trace) = request_no_body(&ctx.app, "GET", "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    assert!(body["data"]["version"].is_string());
    assert!(trace.is_some());
}

#[tokio::test]
async fn user_crud_and_duplicate_conflict() {
    let ctx = build_test_context().await.expect("test context should build");

    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/users",
        Some(json!({ "name": "张三" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    let user_id = body["data"]["id"].as_str().expect("id").to_string();

    // 重名冲突
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/users",
        Some(json!({ "name": "张三" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_err_envelope(&body);

    // 空名称
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/users",
        Some(json!({ "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err_envelope(&body);

    let (status, body, _) = request_no_body(&ctx.app, "GET", "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _, _) =
        request_no_body(&ctx.app, "DELETE", &format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body, _) = request_no_body(&ctx.app, "GET", "/api/users").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn save_report_resolves_week_bucket() {
    let ctx = build_test_context().await.expect("test context should build");
    let user_id = create_user(&ctx.app, "李四").await;

    // 2025-01-12 是周日，按 Monday..Sunday 含端点规则属于第 1 周
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/reports/save",
        Some(json!({
            "dateRange": ["2025-01-06", "2025-01-12"],
            "selectedUser": user_id,
            "reviewMethod": "online",
            "lastWeekPlan": [{"task": "拜访", "expectedResult": "签约", "completion": "完成"}],
            "aiReport": "# 内容"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "save failed: {body}");
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["weekNumber"], 1);
    assert_eq!(body["data"]["year"], 2025);
    assert_eq!(body["data"]["report"]["review_method"], "online");

    // 同一桶的第二份报告共用周行
    let (_, week_id) = save_minimal_report(&ctx.app, &user_id, "2025-01-06", "2025-01-10").await;
    assert_eq!(body["data"]["weekId"], week_id);

    let (status, body, _) = request_no_body(&ctx.app, "GET", "/api/weeks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["report_count"], 2);

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["week"]["week_number"], 1);
    assert_eq!(body["data"]["reports"].as_array().map(|a| a.len()), Some(2));
}

#[tokio::test]
async fn save_report_validation_failures() {
    let ctx = build_test_context().await.expect("test context should build");

    // 缺 dateRange 第二项
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/reports/save",
        Some(json!({
            "dateRange": ["2025-01-06"],
            "selectedUserName": "无名",
            "reviewMethod": "offline"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err_envelope(&body);

    // 用户不存在
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/reports/save",
        Some(json!({
            "dateRange": ["2025-01-06", "2025-01-12"],
            "selectedUserName": "不存在的人",
            "reviewMethod": "offline"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err_envelope(&body);
}

#[tokio::test]
async fn lock_blocks_content_update_until_unlock() {
    let ctx = build_test_context().await.expect("test context should build");
    let user_id = create_user(&ctx.app, "王五").await;
    let (report_id, week_id) =
        save_minimal_report(&ctx.app, &user_id, "2025-02-03", "2025-02-09").await;

    let (status, body, _) =
        request_no_body(&ctx.app, "PUT", &format!("/api/reports/lock/{report_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_locked"], true);

    // 锁定后周统计随之更新
    let (_, body, _) = request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}")).await;
    assert_eq!(body["data"]["week"]["locked_count"], 1);
    assert_eq!(body["data"]["week"]["unlocked_count"], 0);

    // 锁定的报告拒绝内容更新
    let (status, body, _) = request_json(
        &ctx.app,
        "PUT",
        &format!("/api/reports/update/{report_id}"),
        Some(json!({ "aiReport": "改写" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_err_envelope(&body);

    let (status, _, _) =
        request_no_body(&ctx.app, "PUT", &format!("/api/reports/unlock/{report_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = request_json(
        &ctx.app,
        "PUT",
        &format!("/api/reports/update/{report_id}"),
        Some(json!({ "aiReport": "改写" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ai_report"], "改写");
}

#[tokio::test]
async fn delete_report_zeroes_week_statistics() {
    let ctx = build_test_context().await.expect("test context should build");
    let user_id = create_user(&ctx.app, "赵六").await;
    let (report_id, week_id) =
        save_minimal_report(&ctx.app, &user_id, "2025-03-03", "2025-03-09").await;

    let (status, _, _) =
        request_no_body(&ctx.app, "DELETE", &format!("/api/reports/delete/{report_id}")).await;
    assert_eq!(status, StatusCode::OK);

    // 周行保留，计数归零
    let (status, body, _) = request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["week"]["report_count"], 0);
    assert_eq!(body["data"]["week"]["locked_count"], 0);
    assert_eq!(body["data"]["week"]["unlocked_count"], 0);

    // 再删一次是 404
    let (status, body, _) =
        request_no_body(&ctx.app, "DELETE", &format!("/api/reports/delete/{report_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err_envelope(&body);
}

#[tokio::test]
async fn download_word_returns_docx_attachment() {
    let ctx = build_test_context().await.expect("test context should build");
    let user_id = create_user(&ctx.app, "孙七").await;
    let (report_id, _) = save_minimal_report(&ctx.app, &user_id, "2025-03-10", "2025-03-16").await;

    let (status, headers, bytes) = request_raw(
        &ctx.app,
        "GET",
        &format!("/api/reports/download/word/{report_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.contains("officedocument"), "got {content_type}");
    let disposition = headers
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(disposition.starts_with("attachment"));
    // OOXML 是 zip 容器
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn download_pdf_degrades_to_html_without_tools() {
    let ctx = build_test_context().await.expect("test context should build");
    let user_id = create_user(&ctx.app, "周八").await;
    let (report_id, _) = save_minimal_report(&ctx.app, &user_id, "2025-03-17", "2025-03-23").await;

    let (status, headers, bytes) = request_raw(
        &ctx.app,
        "GET",
        &format!("/api/reports/download/pdf/{report_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 测试环境没有转换工具，策略链落到 HTML 兜底
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    assert!(String::from_utf8_lossy(&bytes).contains("<html"));
}

#[tokio::test]
async fn batch_download_zips_multiple_reports() {
    let ctx = build_test_context().await.expect("test context should build");
    let a = create_user(&ctx.app, "成员甲").await;
    let b = create_user(&ctx.app, "成员乙").await;
    let (_, week_id) = save_minimal_report(&ctx.app, &a, "2025-04-07", "2025-04-13").await;
    save_minimal_report(&ctx.app, &b, "2025-04-07", "2025-04-13").await;

    let (status, headers, bytes) = request_raw(
        &ctx.app,
        "GET",
        &format!("/api/weeks/{week_id}/download/word"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/zip")
    );
    assert_eq!(&bytes[..2], b"PK");

    // 单选一份时直接返回文档
    let (_, body, _) = request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}")).await;
    let first_id = body["data"]["reports"][0]["id"].as_str().expect("id").to_string();
    let (status, headers, _) = request_raw(
        &ctx.app,
        "GET",
        &format!("/api/weeks/{week_id}/download/word?reportIds={first_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.contains("officedocument"));

    // 不支持的格式
    let (status, body, _) = request_no_body(
        &ctx.app,
        "GET",
        &format!("/api/weeks/{week_id}/download/xls"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err_envelope(&body);
}

#[tokio::test]
async fn generate_report_uses_llm() {
    let mut llm = mockito::Server::new_async().await;
    let _mock = llm
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LLM_OK_BODY)
        .create_async()
        .await;

    let ctx = build_test_context_with_llm(&llm.url(), None)
        .await
        .expect("test context should build");

    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/reports/generate",
        Some(json!({
            "dateRange": ["2025-01-06", "2025-01-12"],
            "selectedUserName": "张三",
            "reviewMethod": "offline",
            "lastWeekPlan": [],
            "weekPlan": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "generate failed: {body}");
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["content"], "AI 生成的周报内容");
}

#[tokio::test]
async fn generate_stream_emits_sse_frames() {
    let mut llm = mockito::Server::new_async().await;
    let sse_body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"本周\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"顺利\"},\"finish_reason\":null}]}\n\n",
        "data: [DONE]\n\n",
    );
    let _mock = llm
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body)
        .create_async()
        .await;

    let ctx = build_test_context_with_llm(&llm.url(), None)
        .await
        .expect("test context should build");

    let (status, headers, bytes) = request_raw_with_body(
        &ctx.app,
        "POST",
        "/api/reports/generate-stream",
        Some(json!({
            "dateRange": ["2025-01-06", "2025-01-12"],
            "selectedUserName": "张三",
            "reviewMethod": "offline"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .starts_with("text/event-stream"));

    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("\"type\":\"status\""));
    assert!(text.contains("\"type\":\"content\""));
    assert!(text.contains("\"type\":\"complete\""));
    assert!(text.contains("本周顺利"));
}

#[tokio::test]
async fn generate_report_fails_with_bad_gateway_when_llm_down() {
    let ctx = build_test_context().await.expect("test context should build");

    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/api/reports/generate",
        Some(json!({
            "dateRange": ["2025-01-06", "2025-01-12"],
            "reviewMethod": "offline"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_err_envelope(&body);
}

#[tokio::test]
async fn integration_report_lifecycle() {
    let mut llm = mockito::Server::new_async().await;
    let _mock = llm
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LLM_OK_BODY)
        .create_async()
        .await;

    let ctx = build_test_context_with_llm(&llm.url(), None)
        .await
        .expect("test context should build");
    let a = create_user(&ctx.app, "成员甲").await;
    let b = create_user(&ctx.app, "成员乙").await;
    let (_, week_id) = save_minimal_report(&ctx.app, &a, "2025-05-05", "2025-05-11").await;
    save_minimal_report(&ctx.app, &b, "2025-05-05", "2025-05-11").await;

    // 还没有整合报告
    let (status, _, _) =
        request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}/integration")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/api/weeks/{week_id}/integration"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "integration failed: {body}");
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["report_content"], "AI 生成的周报内容");
    assert!(body["data"]["user_names"].as_str().unwrap().contains("成员甲"));
    let integration_id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}/integration")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], integration_id.as_str());

    // 下载整合报告（word）
    let (status, headers, bytes) = request_raw(
        &ctx.app,
        "GET",
        &format!("/api/integration/download/word/{integration_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .contains("officedocument"));
    assert_eq!(&bytes[..2], b"PK");

    let (status, _, _) = request_no_body(
        &ctx.app,
        "DELETE",
        &format!("/api/integration/{integration_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) =
        request_no_body(&ctx.app, "GET", &format!("/api/weeks/{week_id}/integration")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_week_returns_not_found() {
    let ctx = build_test_context().await.expect("test context should build");
    let (status, body, _) = request_no_body(&ctx.app, "GET", "/api/weeks/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err_envelope(&body);
}
