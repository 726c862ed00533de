mod error;
mod handler;
mod query;

pub use error::SearchError;
pub use handler::SearchHandler;
pub use query::{has_balanced_parentheses, scope_queries, scope_query, tenant_clause, SearchRequest};

pub const SEARCH_PATH: &str = "/workflow/search";
pub const QUERY_PARAM: &str = "query";
pub const TENANT_FIELD: &str = "workflowType";
