mod common;

use alloy::primitives::U256;
use axum::http::StatusCode;
use axum_test::TestServer;
use common::*;
use dlp_rankings_backend::api::{create_router, AppState, ErrorResponse};
use dlp_rankings_backend::highlights::Highlights;
use dlp_rankings_backend::RankedDlps;
use serde_json::{json, Value};
use std::sync::Arc;

fn server_with(
    registry: FakeRegistry,
    performance: FakePerformance,
    reply: Option<&str>,
) -> TestServer {
    let state = AppState::new(
        aggregator(registry, performance),
        Arc::new(FakeSummarizer {
            reply: reply.map(str::to_string),
        }),
    );
    TestServer::new(create_router(state)).unwrap()
}

fn server() -> TestServer {
    let registry =
        FakeRegistry::with_dlps(&[(1, "Reddit Data"), (2, "Spotify Wrapped"), (3, "YKYR")]);
    let mut source = FakePerformance::with_totals(3, &[(1, 9100), (2, 6000), (3, 1200)]);
    source.records.insert((4, U256::from(3)), performance(9999));
    server_with(registry, source, Some("A data pool"))
}

#[tokio::test]
async fn test_health() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_list_dlps_camel_case_payload() {
    let response = server().get("/api/dlps").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["epoch"], 3);
    assert!(body["fetchedAt"].is_string());

    let first = &body["dlps"][0];
    assert_eq!(first["id"], "1");
    assert_eq!(first["rank"], 1);
    assert_eq!(first["totalScore"], 91.0);
    assert_eq!(first["uniqueContributors"], "910");
    assert_eq!(first["historicalData"].as_array().map(|a| a.len()), Some(31));
    assert!(first["iconUrl"].is_string());
}

#[tokio::test]
async fn test_list_dlps_for_other_epoch_and_search() {
    let server = server();

    let response = server.get("/api/dlps").add_query_param("epoch", 4).await;
    let body: RankedDlps = response.json();
    assert_eq!(body.epoch, 4);
    assert_eq!(body.dlps[0].id, "3");
    assert_eq!(body.dlps[0].rank, 1);
    assert!(body.dlps[1..].iter().all(|d| d.rank == 0));

    let response = server.get("/api/dlps").add_query_param("search", "spot").await;
    let body: RankedDlps = response.json();
    assert_eq!(body.dlps.len(), 1);
    assert_eq!(body.dlps[0].name, "Spotify Wrapped");
    assert_eq!(body.dlps[0].rank, 2);
}

#[tokio::test]
async fn test_bad_query_string_is_json_400() {
    let server = server();

    for path in ["/api/dlps", "/api/dlps/highlights", "/api/dlps/1/trends"] {
        let response = server
            .get(path)
            .add_query_param("epoch", "abc")
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: ErrorResponse = response.json();
        assert_eq!(body.code, 400);
        assert!(body.error.starts_with("Invalid request"));
    }

    let response = server
        .get("/api/dlps/highlights")
        .add_query_param("limit", -1)
        .expect_failure()
        .await;
    assert_eq!(response.json::<ErrorResponse>().code, 400);
}

#[tokio::test]
async fn test_registry_outage_is_still_200() {
    let mut registry = FakeRegistry::with_dlps(&[(1, "Alpha")]);
    registry.fail_ids = true;
    let server = server_with(registry, FakePerformance::default(), None);

    let response = server.get("/api/dlps").await;
    response.assert_status_ok();
    let body: RankedDlps = response.json();
    assert!(body.dlps.is_empty());
}

#[tokio::test]
async fn test_refresh_with_and_without_body() {
    let server = server();

    let response = server.post("/api/dlps/refresh").await;
    response.assert_status_ok();
    assert_eq!(response.json::<RankedDlps>().epoch, 3);

    let response = server.post("/api/dlps/refresh").json(&json!({ "epoch": 4 })).await;
    response.assert_status_ok();
    assert_eq!(response.json::<RankedDlps>().epoch, 4);

    let response = server
        .post("/api/dlps/refresh")
        .text("{not json")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>().code, 400);
}

#[tokio::test]
async fn test_highlights() {
    let response = server().get("/api/dlps/highlights").add_query_param("limit", 2).await;
    response.assert_status_ok();

    let highlights: Highlights = response.json();
    assert_eq!(highlights.top_score.len(), 2);
    assert_eq!(highlights.top_score[0].name, "Reddit Data");
    assert_eq!(highlights.best_ranked[1].label, "#2");
    assert_eq!(highlights.most_contributors[0].label, "910");
}

#[tokio::test]
async fn test_trends_for_known_and_unknown_dlp() {
    let server = server();

    let response = server.get("/api/dlps/2/trends").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Spotify Wrapped");
    assert_eq!(body["series"].as_array().map(|s| s.len()), Some(7));
    assert_eq!(body["series"][0]["metric"], "totalScore");
    assert_eq!(body["series"][0]["points"].as_array().map(|p| p.len()), Some(31));

    let response = server.get("/api/dlps/42/trends").expect_failure().await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_summarize_ok_and_unavailable() {
    let response = server()
        .post("/api/summarize")
        .json(&json!({ "metadata": "{}" }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "summary": "A data pool (2 bytes)", "status": "ok" }));

    let unavailable = server_with(FakeRegistry::default(), FakePerformance::default(), None);
    let response = unavailable
        .post("/api/summarize")
        .json(&json!({ "metadata": "{}" }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "summary": null, "status": "unavailable" }));
}

#[tokio::test]
async fn test_summarize_rejects_malformed_body() {
    let response = server()
        .post("/api/summarize")
        .text("metadata=oops")
        .expect_failure()
        .await;
    assert!(response.status_code().is_client_error());
    assert_eq!(response.json::<ErrorResponse>().code, response.status_code().as_u16());
}
