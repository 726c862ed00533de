use super::{random_tenant_id, TestHarness};
use anyhow::Result;
use futures_util::future::join_all;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

const PROBE_PARAM: &str = "probe";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tenants_never_see_each_others_scope() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(20))
                .set_body_string("{}"),
        )
        .mount(harness.downstream())
        .await;

    let tenants: Vec<String> = (0..8).map(|i| random_tenant_id(&format!("tenant-{i}"))).collect();

    let calls = tenants.iter().flat_map(|tenant| {
        let harness = &harness;
        (0..4).map(move |_| async move {
            harness
                .search(
                    Some(tenant.as_str()),
                    &[("query", "status=RUNNING"), (PROBE_PARAM, tenant.as_str())],
                )
                .await
        })
    });

    for response in join_all(calls).await {
        assert_eq!(response?.status(), 200);
    }

    let requests = harness
        .downstream()
        .received_requests()
        .await
        .unwrap_or_default();
    assert_eq!(requests.len(), tenants.len() * 4);

    for request in requests {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        let probe = param(PROBE_PARAM).expect("probe forwarded");
        let query = param("query").expect("query forwarded");
        assert_eq!(
            query,
            format!("workflowType STARTS_WITH '{probe}' AND (status=RUNNING)")
        );
    }

    harness.shutdown().await
}

#[tokio::test]
async fn one_tenants_failure_does_not_leak_into_the_next_request() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(harness.downstream())
        .await;

    let acme = harness
        .search(Some("acme"), &[("query", "x) OR (status=FAILED")])
        .await?;
    assert_eq!(acme.status(), 400);

    let anonymous = harness.search(None, &[]).await?;
    assert_eq!(anonymous.status(), 401);

    let beta = harness.search(Some("beta"), &[]).await?;
    assert_eq!(beta.status(), 200);

    assert_eq!(
        harness.forwarded_queries().await,
        vec!["workflowType STARTS_WITH 'beta'"]
    );

    harness.shutdown().await
}

#[tokio::test]
async fn tenant_cannot_widen_scope_with_or() -> Result<()> {
    let harness = TestHarness::new().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(harness.downstream())
        .await;

    harness
        .search(
            Some("acme"),
            &[("query", "status=FAILED OR workflowType STARTS_WITH 'globex'")],
        )
        .await?;

    let forwarded = harness.forwarded_queries().await;
    assert_eq!(forwarded.len(), 1);
    assert!(forwarded[0].starts_with("workflowType STARTS_WITH 'acme' AND ("));
    assert!(forwarded[0].ends_with(')'));

    harness.shutdown().await
}
