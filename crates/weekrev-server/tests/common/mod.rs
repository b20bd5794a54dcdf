#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use weekrev_ai::{EndpointConfig, FailoverGenerator, OpenAiCompatProvider};
use weekrev_export::PdfOptions;
use weekrev_server::app;
use weekrev_server::config::ServerConfig;
use weekrev_server::state::AppState;
use weekrev_storage::ReportStore;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: axum::Router,
}

pub async fn build_test_context() -> Result<TestContext> {
    // 未配置 LLM：只测试存储与导出相关端点
    build_test_context_with_llm("http://127.0.0.1:1", None).await
}

pub async fn build_test_context_with_llm(
    primary_url: &str,
    backup_url: Option<&str>,
) -> Result<TestContext> {
    weekrev_common::id::init(1, 1);

    let temp_dir = tempfile::tempdir()?;
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("weekrev.db").display()
    );
    let store = Arc::new(ReportStore::new(&db_url, temp_dir.path()).await?);

    let primary = OpenAiCompatProvider::new(EndpointConfig::new(
        "primary",
        primary_url,
        "glm-4",
        "test-key",
    ))?;
    let backup = match backup_url {
        Some(url) => Some(OpenAiCompatProvider::new(EndpointConfig::new(
            "backup", url, "glm-4", "test-key",
        ))?),
        None => None,
    };
    let generator = Arc::new(FailoverGenerator::new(primary, backup));

    let config = ServerConfig::default();

    let state = AppState {
        store,
        generator,
        pdf_options: PdfOptions {
            // 测试环境没有浏览器，让 PDF 链条落到 HTML 兜底
            chromium_bin: "missing-chromium-binary".to_string(),
            wkhtmltopdf_bin: "missing-wkhtmltopdf-binary".to_string(),
            timeout_secs: 5,
        },
        start_time: Utc::now(),
        config: Arc::new(config),
    };

    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        state,
        app,
    })
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = builder.header("Content-Type", "application/json");

    let req_body = body.unwrap_or(Value::Null).to_string();
    let req = builder
        .body(Body::from(req_body))
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    request_json(app, method, uri, None).await
}

/// 二进制下载响应：状态码 + 响应头 + 原始字节。
pub async fn request_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, HeaderMap, Vec<u8>) {
    request_raw_with_body(app, method, uri, None).await
}

/// 带 JSON 请求体的原始响应（SSE 等非 JSON 响应用）。
pub async fn request_raw_with_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let req_body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let req = builder.body(req_body).expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (status, headers, bytes.to_vec())
}

pub fn assert_ok_envelope(json: &Value) {
    assert_eq!(json["success"], true);
    assert!(json.get("trace_id").is_some());
    assert!(json.get("error").is_none());
}

pub fn assert_err_envelope(json: &Value) {
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
    assert!(json.get("trace_id").is_some());
    assert!(json["data"].is_null());
}

pub fn decode_data<T: DeserializeOwned>(json: &Value) -> T {
    serde_json::from_value(json["data"].clone()).expect("data should decode")
}

/// 建一个用户，返回其 id。
pub async fn create_user(app: &axum::Router, name: &str) -> String {
    let (status, body, _) = request_json(
        app,
        "POST",
        "/api/users",
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"]
        .as_str()
        .expect("user id should exist")
        .to_string()
}

/// 保存一份最小周报，返回 (报告 id, 周 id)。
pub async fn save_minimal_report(
    app: &axum::Router,
    user_id: &str,
    start: &str,
    end: &str,
) -> (String, String) {
    let (status, body, _) = request_json(
        app,
        "POST",
        "/api/reports/save",
        Some(serde_json::json!({
            "dateRange": [start, end],
            "selectedUser": user_id,
            "reviewMethod": "offline",
            "lastWeekPlan": [],
            "lastWeekActions": [],
            "weekPlan": [],
            "coordinationItems": "",
            "otherItems": "",
            "aiReport": "# 周报\n\n本周顺利。"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "save failed: {body}");
    (
        body["data"]["id"].as_str().expect("report id").to_string(),
        body["data"]["weekId"].as_str().expect("week id").to_string(),
    )
}

pub const LLM_OK_BODY: &str = r#"{"id":"1","object":"chat.completion","created":0,"model":"glm-4",
    "choices":[{"index":0,"message":{"role":"assistant","content":"AI 生成的周报内容"},"finish_reason":"stop"}],
    "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#;
