use workflow_proxy_http::auth::TenantId;
use workflow_proxy_http::downstream::QueryParams;

// Re-export the e2e harness module
#[path = "../tests/e2e/harness.rs"]
pub mod e2e_harness;

pub use e2e_harness::{
    find_free_port, init_test_tracing, random_tenant_id, TestHarness, SEARCH_PATH, TENANT_HEADER,
};

/// Inputs for the query-scoping benchmarks, parsed once up front.
pub struct ScopingBenchFixture {
    pub tenant: TenantId,
    pub params: QueryParams,
}

impl ScopingBenchFixture {
    pub fn new(tenant_id: &str, raw_query: &str) -> Self {
        Self {
            tenant: TenantId::new(tenant_id).expect("valid bench tenant"),
            params: QueryParams::parse(Some(raw_query)).expect("valid bench query"),
        }
    }
}
