//! # Integration Tests for reqmgmt-api
//!
//! Drives the assembled router end to end over the in-memory store: health
//! probes, header search and lookup, upload rejection paths, markdown export
//! and the OpenAPI document.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;

use reqmgmt_api::config::AppConfig;
use reqmgmt_api::state::AppState;
use reqmgmt_core::{MemoryStore, RecordStore, RequirementDetail, RequirementHeader};

const BOUNDARY: &str = "reqmgmt-test-boundary";

/// Helper: app over a seeded store exporting into `export_dir`.
async fn test_app(export_dir: &Path) -> axum::Router {
    let store = MemoryStore::new();

    let mut first = RequirementHeader::new("REQ-1");
    first.project_name = Some("华南数据中心扩容".into());
    first.status = Some("A".into());
    first.submit_time = NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(9, 0, 0));
    store.insert_header(&first).await.unwrap();

    let mut second = RequirementHeader::new("REQ-2");
    second.project_name = Some("华北数据中心".into());
    second.status = Some("AB".into());
    second.submit_time = NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(9, 0, 0));
    store.insert_header(&second).await.unwrap();

    let mut third = RequirementHeader::new("REQ-3");
    third.project_name = Some("园区网络".into());
    store.insert_header(&third).await.unwrap();

    let mut detail = RequirementDetail::new("REQ-1", "存储扩容");
    detail.remark = Some("首批交付".into());
    store.insert_detail(&detail).await.unwrap();
    store
        .insert_detail(&RequirementDetail::new("REQ-1", "网络改造"))
        .await
        .unwrap();

    let config = AppConfig {
        markdown_export_dir: export_dir.to_path_buf(),
        ..AppConfig::default()
    };
    reqmgmt_api::app(AppState::with_store(config, Arc::new(store)))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart(uri: &str, field: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.xlsx\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/health/liveness"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/health/readiness"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Header Search ------------------------------------------------------------

#[tokio::test]
async fn test_page_query_orders_by_submit_time() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json("/req/list/page", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "success");
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["current"], 1);
    assert_eq!(json["data"]["size"], 10);
    assert_eq!(json["data"]["pages"], 1);

    let order: Vec<&str> = json["data"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["reqNo"].as_str().unwrap())
        .collect();
    assert_eq!(order, ["REQ-2", "REQ-1", "REQ-3"]);
}

#[tokio::test]
async fn test_page_query_substring_filter() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json(
            "/req/list/page",
            serde_json::json!({ "projectName": "数据中心" }),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 2);
}

#[tokio::test]
async fn test_page_query_status_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json(
            "/req/list/page",
            serde_json::json!({ "status": "A" }),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["records"][0]["reqNo"], "REQ-1");
}

#[tokio::test]
async fn test_page_query_paging() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json(
            "/req/list/page",
            serde_json::json!({ "current": 2, "size": 2 }),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["pages"], 2);
    assert_eq!(json["data"]["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_page_query_malformed_json_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/req/list/page")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app(dir.path()).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["data"].is_null());
}

// -- Header and Detail Lookup -------------------------------------------------

#[tokio::test]
async fn test_get_header() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/list/REQ-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["reqNo"], "REQ-1");
    assert_eq!(json["data"]["projectName"], "华南数据中心扩容");
}

#[tokio::test]
async fn test_unknown_header_is_404_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/list/REQ-404"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "requirement 'REQ-404' not found");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_list_details() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/detail/REQ-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["reqName"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["存储扩容", "网络改造"]);
}

#[tokio::test]
async fn test_details_of_unknown_ticket_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/detail/REQ-404"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"], serde_json::json!([]));
}

// -- Import -------------------------------------------------------------------

#[tokio::test]
async fn test_import_without_file_field_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(multipart("/req/import/list", "other", b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_import_without_multipart_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json("/req/import/detail", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_of_non_workbook_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(multipart(
            "/req/import/list",
            "file",
            b"this is not a spreadsheet",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("import failed: "));
}

const HEADER_WORKBOOK: &[u8] = include_bytes!("fixtures/req_list.xlsx");
const DETAIL_WORKBOOK: &[u8] = include_bytes!("fixtures/req_detail.xlsx");

#[tokio::test]
async fn test_import_headers_from_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    // Three data rows, one without a ticket number.
    let response = app
        .clone()
        .oneshot(multipart("/req/import/list", "file", HEADER_WORKBOOK))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], 2);

    let response = app.clone().oneshot(get("/req/list/REQ-100")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["projectName"], "边缘计算平台");
    assert_eq!(json["data"]["totalWorkload"], "12.5");
    assert_eq!(json["data"]["submitTime"], "2024-06-01 10:00:00");

    // Importing the same file again updates in place.
    let response = app
        .clone()
        .oneshot(multipart("/req/import/list", "file", HEADER_WORKBOOK))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"], 2);

    let response = app
        .oneshot(post_json("/req/list/page", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["total"], 5);
}

#[tokio::test]
async fn test_import_details_from_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    // Four data rows, one without a requirement name.
    let response = app
        .clone()
        .oneshot(multipart("/req/import/detail", "file", DETAIL_WORKBOOK))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], 3);

    let response = app
        .clone()
        .oneshot(multipart("/req/import/detail", "file", DETAIL_WORKBOOK))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"], 3);

    let response = app.oneshot(get("/req/detail/REQ-100")).await.unwrap();
    let json = body_json(response).await;
    let details = json["data"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["reqName"], "统一登录");
    assert_eq!(details[0]["reqDesc"], "对接企业目录");
    assert_eq!(details[1]["evalHours"], "2.5");
}

// -- Markdown Export ----------------------------------------------------------

#[tokio::test]
async fn test_export_one_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/export/markdown/REQ-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let path = json["data"].as_str().unwrap();
    assert!(path.ends_with("需求_REQ-1.md"));

    let written = std::fs::read_to_string(path).unwrap();
    assert!(written.contains("REQ-1"));
    assert!(written.contains("## 二、需求详情信息"));
    assert!(written.contains("存储扩容"));
}

#[tokio::test]
async fn test_export_of_unknown_ticket_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/export/markdown/REQ-404"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("REQ-404"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_markdown_content_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/req/export/markdown/REQ-3/content"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let content = json["data"].as_str().unwrap();
    assert!(content.contains("园区网络"));
    assert!(!content.contains("## 二、需求详情信息"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_batch_export_skips_unknown_tickets() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json(
            "/req/export/markdown/batch",
            serde_json::json!({ "reqNos": ["REQ-1", "REQ-404", "REQ-2"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_batch_export_without_list_exports_everything() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json(
            "/req/export/markdown/batch",
            serde_json::json!({ "reqNos": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[tokio::test]
async fn test_batch_export_skips_blank_ticket() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(post_json(
            "/req/export/markdown/batch",
            serde_json::json!({ "reqNos": ["REQ-1", "  "] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let paths = json["data"].as_array().unwrap();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].as_str().unwrap().ends_with("需求_REQ-1.md"));
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_document() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .await
        .oneshot(get("/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert!(json["paths"]["/req/list/page"].is_object());
    assert!(json["paths"]["/req/export/markdown/batch"].is_object());
}
