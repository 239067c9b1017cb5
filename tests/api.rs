use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use gst_reco_rust::api::router;
use gst_reco_rust::models::FilingPeriod;
use gst_reco_rust::portal::{CsvPortalSource, PortalSession};
use gst_reco_rust::{ReconOptions, ReconciliationService};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn app(cache_dir: &Path) -> Router {
    let portal = Arc::new(CsvPortalSource::new(cache_dir));
    router(Arc::new(ReconciliationService::new(ReconOptions::default(), portal)))
}

fn record(source: &str, invoice: &str, value: &str) -> Value {
    json!({
        "supplier_id": "27AAAAA0000A1Z5",
        "supplier_name": "Acme Traders",
        "invoice_number": invoice,
        "invoice_date": "2024-04-05",
        "taxable_value": value,
        "tax_amount": "0",
        "source": source,
    })
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = post(app, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_check_responds() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn reconciles_uploaded_records() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "books": [record("BOOKS", "INV-01", "10000.00"), record("BOOKS", "INV-02", "250.00")],
        "portal": [record("PORTAL", "INV01", "10000.50"), record("PORTAL", "INV-03", "99.00")],
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let summary = &json["report"]["result"]["summary"];
    assert_eq!(summary["total_pairs"], 3);
    assert_eq!(summary["counts"]["matched"], 1);
    assert_eq!(summary["counts"]["missing_in_books"], 1);
    assert_eq!(summary["counts"]["missing_in_portal"], 1);
    assert_eq!(json["report"]["result"]["pairs"][0]["status"], "MATCHED");
}

#[tokio::test]
async fn request_tolerance_overrides_default() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "books": [record("BOOKS", "INV-01", "10000.00")],
        "portal": [record("PORTAL", "INV-01", "10005.00")],
        "tolerance": 5,
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["result"]["pairs"][0]["status"], "MATCHED");
}

#[tokio::test]
async fn negative_tolerance_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "books": [record("BOOKS", "INV-01", "1.00")],
        "tolerance": "-1",
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json.get("report").is_none());
}

#[tokio::test]
async fn export_returns_filtered_csv() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "books": [record("BOOKS", "INV-01", "10000.00"), record("BOOKS", "INV-02", "250.00")],
        "portal": [record("PORTAL", "INV-01", "10000.00")],
        "status": "MISSING_IN_PORTAL",
    });

    let (status, bytes) = post(app(dir.path()), "/api/reco/2b/export", body).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("INV-02"));
    assert!(lines[1].ends_with("MISSING_IN_PORTAL"));
}

#[tokio::test]
async fn portal_endpoint_reads_cached_gstr2b() {
    let dir = tempfile::tempdir().unwrap();
    let period = FilingPeriod::Month { year: 2024, month: 4 };
    let source = CsvPortalSource::new(dir.path());
    std::fs::write(
        source.path_for("27AAAAA0000A1Z5", &period).unwrap(),
        "GSTIN/UIN,Invoice,Date,Taxable\n27AAAAA0000A1Z5,INV-01,2024-04-05,10000.00\n",
    )
    .unwrap();

    let session = PortalSession::verified("s-1", "27AAAAA0000A1Z5", "acme", Utc::now());
    let body = json!({
        "session": session,
        "period": period,
        "books": [record("BOOKS", "INV-01", "10000.00")],
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b/portal", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["result"]["summary"]["counts"]["matched"], 1);
    assert_eq!(json["report"]["period"], "April 2024");
}

#[tokio::test]
async fn expired_session_reconciles_against_empty_portal() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = PortalSession::verified("s-2", "27AAAAA0000A1Z5", "acme", Utc::now());
    session.expires_at = Utc::now() - chrono::Duration::minutes(5);
    let body = json!({
        "session": session,
        "period": { "type": "month", "year": 2024, "month": 4 },
        "books": [record("BOOKS", "INV-01", "10000.00")],
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b/portal", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["result"]["summary"]["counts"]["missing_in_portal"], 1);
}

#[tokio::test]
async fn batch_endpoint_returns_one_item_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "batches": [
            { "label": "a", "books": [record("BOOKS", "INV-01", "1.00")], "portal": [] },
            { "label": "b", "books": [], "portal": [record("PORTAL", "INV-09", "2.00")] },
        ],
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b/batch", body).await;
    assert_eq!(status, StatusCode::OK);
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["label"], "a");
    assert_eq!(items[0]["report"]["result"]["summary"]["counts"]["missing_in_portal"], 1);
    assert_eq!(items[1]["report"]["result"]["summary"]["counts"]["missing_in_books"], 1);
}

#[tokio::test]
async fn export_accepts_search_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "books": [record("BOOKS", "INV-01", "10000.00"), record("BOOKS", "INV-02", "250.00")],
        "portal": [record("PORTAL", "INV-01", "10004.00")],
        "tolerance": "5",
        "search": "inv-01",
    });

    let (status, bytes) = post(app(dir.path()), "/api/reco/2b/export", body).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("-4.00,MATCHED"));
}

#[tokio::test]
async fn portal_endpoint_applies_request_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let period = FilingPeriod::Month { year: 2024, month: 4 };
    let source = CsvPortalSource::new(dir.path());
    std::fs::write(
        source.path_for("27AAAAA0000A1Z5", &period).unwrap(),
        "GSTIN/UIN,Invoice,Date,Taxable\n27AAAAA0000A1Z5,INV-01,2024-04-05,10003.00\n",
    )
    .unwrap();

    let session = PortalSession::verified("s-3", "27AAAAA0000A1Z5", "acme", Utc::now());
    let body = json!({
        "session": session,
        "period": period,
        "books": [record("BOOKS", "INV-01", "10000.00")],
        "tolerance": 3,
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/2b/portal", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["result"]["summary"]["counts"]["matched"], 1);
}

#[tokio::test]
async fn returns_comparison_flags_mismatched_months() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "kind": "gstr1_vs_gstr3b",
        "months": [
            { "year": 2024, "month": 5, "rows": [
                { "particular": "3.1.a Taxable Value", "left": "1000.00", "right": "990.00" }
            ] },
            { "year": 2024, "month": 4, "rows": [
                { "particular": "3.1.a Taxable Value", "left": "500.00", "right": "499.50" },
                { "particular": "3.1.a IGST", "left": "90.00" }
            ] },
        ],
        "period": { "type": "financial_year", "start_year": 2024 },
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/returns", body).await;
    assert_eq!(status, StatusCode::OK);
    let comparison = &json["comparison"];
    assert_eq!(comparison["status"], "MISMATCHED");
    assert_eq!(comparison["blocks"][0]["label"], "April 2024");
    assert_eq!(comparison["blocks"][0]["status"], "MISMATCHED");
    assert_eq!(comparison["blocks"][1]["label"], "May 2024");
    assert_eq!(comparison["right_label"], "GSTR-3B");
}

#[tokio::test]
async fn returns_comparison_rejects_invalid_month() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "kind": "gstr3b_vs_books",
        "months": [{ "year": 2024, "month": 0, "rows": [] }],
    });

    let (status, json) = post_json(app(dir.path()), "/api/reco/returns", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}
