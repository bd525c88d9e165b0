use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use btc_dashboard::config::DataConfig;
use btc_dashboard::server::{create_server, AppState, ErrorEnvelope};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const HEADER: &str = "\"Time\"\t\"BTC / Addr Cnt of Bal ≥ $1K\"\t\"BTC / Val in Addrs w/ Bal ≥ $10K USD\"\t\"BTC / Val in Addrs w/ Bal ≥ $100K USD\"\t\"BTC / Val in Addrs w/ Bal ≥ $1M USD\"\t\"BTC / Val in Addrs w/ Bal ≥ $10M USD\"";

fn write_utf16le(dir: &Path, content: &str) -> PathBuf {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(content.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
    let path = dir.join("export.csv");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn app_with(path: PathBuf) -> Router {
    create_server(AppState::new(DataConfig {
        path,
        strict_columns: true,
    }))
}

fn fixture_app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let content = [
        HEADER,
        "2022-12-01\t1\t2\t3\t4\t5",
        "2023-01-10\tabc\t2\t3\t4\t5",
        "2023-02-02\t1\t2\t3\t4\t5",
    ]
    .join("\n");
    let path = write_utf16le(dir.path(), &content);
    (dir, app_with(path))
}

async fn send(app: Router, method: &str, uri: &str) -> Result<(StatusCode, axum::http::HeaderMap, Vec<u8>)> {
    let request = Request::builder().method(method).uri(uri).body(Body::empty())?;
    let response = app.oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = hyper::body::to_bytes(response.into_body()).await?;
    Ok((status, headers, body.to_vec()))
}

#[tokio::test]
async fn test_get_returns_all_records() -> Result<()> {
    let (_dir, app) = fixture_app();
    let (status, headers, body) = send(app, "GET", "/btc-addresses").await?;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str()?.starts_with("application/json"));

    let value: serde_json::Value = serde_json::from_slice(&body)?;
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["time"], "2022-12-01T00:00:00.000Z");
    // "abc" is served as null and the row stays
    assert!(items[1][">$1k"].is_null());
    assert_eq!(items[2][">$10m"], 5.0);
    Ok(())
}

#[tokio::test]
async fn test_range_query_filters_server_side() -> Result<()> {
    let (_dir, app) = fixture_app();
    let (status, _, body) = send(app, "GET", "/btc-addresses?range=1M").await?;

    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&body)?;
    let times: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["time"].as_str().unwrap())
        .collect();
    assert_eq!(times, vec!["2023-01-10T00:00:00.000Z", "2023-02-02T00:00:00.000Z"]);
    Ok(())
}

#[tokio::test]
async fn test_unknown_range_is_bad_request() -> Result<()> {
    let (_dir, app) = fixture_app();
    let (status, _, body) = send(app, "GET", "/btc-addresses?range=6M").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: ErrorEnvelope = serde_json::from_slice(&body)?;
    assert!(envelope.error.contains("6M"));
    Ok(())
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed() -> Result<()> {
    for method in ["POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
        let (_dir, app) = fixture_app();
        let (status, headers, body) = send(app, method, "/btc-addresses").await?;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[header::ALLOW], "GET");
        assert_eq!(String::from_utf8(body)?, format!("Method {} Not Allowed", method));
    }
    Ok(())
}

#[tokio::test]
async fn test_head_is_method_not_allowed() -> Result<()> {
    let (_dir, app) = fixture_app();
    let (status, headers, _) = send(app, "HEAD", "/btc-addresses").await?;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "GET");
    Ok(())
}

#[tokio::test]
async fn test_cors_preflight_on_balances_is_method_not_allowed() -> Result<()> {
    let (_dir, app) = fixture_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/btc-addresses")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET");
    Ok(())
}

#[tokio::test]
async fn test_missing_file_returns_error_envelope() -> Result<()> {
    let dir = tempdir()?;
    let app = app_with(dir.path().join("missing.csv"));
    let (status, _, body) = send(app, "GET", "/btc-addresses").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let envelope: ErrorEnvelope = serde_json::from_slice(&body)?;
    assert_eq!(envelope.message, "Error processing CSV file");
    assert!(!envelope.error.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_column_returns_error_envelope() -> Result<()> {
    let dir = tempdir()?;
    let path = write_utf16le(dir.path(), "\"Time\"\t\"Other\"\n2023-01-01\t1\n");
    let (status, _, body) = send(app_with(path), "GET", "/btc-addresses").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let envelope: ErrorEnvelope = serde_json::from_slice(&body)?;
    assert!(envelope.error.contains("BTC / Addr Cnt of Bal ≥ $1K"));
    Ok(())
}

#[tokio::test]
async fn test_file_is_reread_per_request() -> Result<()> {
    let dir = tempdir()?;
    let path = write_utf16le(dir.path(), &format!("{}\n2023-01-01\t1\t2\t3\t4\t5\n", HEADER));
    let app = app_with(path.clone());

    let (_, _, first) = send(app.clone(), "GET", "/btc-addresses").await?;
    let first: serde_json::Value = serde_json::from_slice(&first)?;
    assert_eq!(first.as_array().unwrap().len(), 1);

    write_utf16le(
        dir.path(),
        &format!("{}\n2023-01-01\t1\t2\t3\t4\t5\n2023-01-02\t1\t2\t3\t4\t5\n", HEADER),
    );
    let (_, _, second) = send(app, "GET", "/btc-addresses").await?;
    let second: serde_json::Value = serde_json::from_slice(&second)?;
    assert_eq!(second.as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_health_and_dashboard_routes() -> Result<()> {
    let (_dir, app) = fixture_app();

    let (status, _, body) = send(app.clone(), "GET", "/health").await?;
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(health["status"], "healthy");

    let (status, headers, body) = send(app, "GET", "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str()?.starts_with("text/html"));
    assert!(String::from_utf8(body)?.contains("/btc-addresses"));
    Ok(())
}
