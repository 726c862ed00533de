use super::{init_test_tracing, TestHarness, SEARCH_PATH, TENANT_HEADER};
use anyhow::Result;
use serde_json::Value;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn acme_failed_search_is_scoped_and_relayed() -> Result<()> {
    init_test_tracing();
    let harness = TestHarness::new().await?;
    let payload = r#"{"totalHits":2,"results":[{"workflowId":"a1"},{"workflowId":"a2"}]}"#;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param(
            "query",
            "workflowType STARTS_WITH 'acme' AND (status=FAILED)",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(payload, "application/json"),
        )
        .expect(1)
        .mount(harness.downstream())
        .await;

    let response = harness
        .search(Some("acme"), &[("query", "status=FAILED")])
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.text().await?, payload);

    harness.shutdown().await
}

#[tokio::test]
async fn beta_bare_search_gets_tenant_clause_only() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(harness.downstream())
        .await;

    let response = harness.search(Some("beta"), &[]).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        harness.forwarded_queries().await,
        vec!["workflowType STARTS_WITH 'beta'"]
    );

    harness.shutdown().await
}

#[tokio::test]
async fn unauthenticated_search_never_reaches_downstream() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(harness.downstream())
        .await;

    let response = harness.search(None, &[("query", "status=FAILED")]).await?;

    assert_eq!(response.status(), 401);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "AUTH_HEADER_MISSING");
    assert_eq!(body["request_id"].as_str().map(str::to_string), request_id);

    harness.shutdown().await
}

#[tokio::test]
async fn pagination_and_sort_pass_through() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .and(query_param("start", "40"))
        .and(query_param("size", "20"))
        .and(query_param("sort", "startTime:DESC"))
        .and(query_param("freeText", "invoice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(harness.downstream())
        .await;

    let response = harness
        .search(
            Some("acme"),
            &[
                ("start", "40"),
                ("size", "20"),
                ("sort", "startTime:DESC"),
                ("freeText", "invoice"),
            ],
        )
        .await?;

    assert_eq!(response.status(), 200);
    harness.shutdown().await
}

#[tokio::test]
async fn repeated_query_values_are_each_scoped() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(harness.downstream())
        .await;

    let response = harness
        .search(
            Some("acme"),
            &[("query", "status=FAILED OR status=TIMED_OUT"), ("query", "version=2")],
        )
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        harness.forwarded_queries().await,
        vec!["workflowType STARTS_WITH 'acme' AND (status=FAILED OR status=TIMED_OUT) AND (version=2)"]
    );

    harness.shutdown().await
}

#[tokio::test]
async fn unreachable_downstream_answers_quickly() -> Result<()> {
    let dead_port = super::find_free_port()?;
    let harness = TestHarness::with_config(|config| {
        config.downstream_url = format!("http://127.0.0.1:{}", dead_port);
    })
    .await?;

    let start = Instant::now();
    let response = harness.search(Some("acme"), &[]).await?;

    assert_eq!(response.status(), 503);
    assert!(start.elapsed() < Duration::from_secs(1));

    harness.shutdown().await
}

#[tokio::test]
async fn request_id_is_echoed() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(harness.downstream())
        .await;

    let response = harness
        .http_client()
        .get(harness.proxy_url(SEARCH_PATH))
        .header(TENANT_HEADER, "acme")
        .header("x-request-id", "trace-7")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-request-id"], "trace-7");

    harness.shutdown().await
}
