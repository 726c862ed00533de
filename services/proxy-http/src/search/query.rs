use super::{SearchError, QUERY_PARAM, TENANT_FIELD};
use crate::auth::TenantId;
use crate::downstream::QueryParams;

pub const DEFAULT_START: u32 = 0;
pub const DEFAULT_SIZE: u32 = 100;
pub const DEFAULT_FREE_TEXT: &str = "*";

/// Mandatory predicate confining a search to one tenant's workflows.
pub fn tenant_clause(tenant: &TenantId) -> String {
    format!("{} STARTS_WITH '{}'", TENANT_FIELD, tenant)
}

/// Final downstream query for a single optional caller filter.
pub fn scope_query(tenant: &TenantId, caller: Option<&str>) -> String {
    scope_queries(tenant, caller)
}

/// Final downstream query: the tenant clause, then every non-blank caller
/// filter ANDed on inside its own parentheses so that no operator in a
/// caller filter can bind looser than the tenant clause.
pub fn scope_queries<'a, I>(tenant: &TenantId, caller: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scoped = tenant_clause(tenant);
    for clause in caller.into_iter().filter(|c| !c.trim().is_empty()) {
        scoped.push_str(" AND (");
        scoped.push_str(clause);
        scoped.push(')');
    }
    scoped
}

/// Whether every parenthesis outside quoted literals is matched.
///
/// An unmatched `)` would close the wrapping group early and let the rest of
/// the filter escape it. Any backslash fails the check: the downstream lexer
/// reads `\'` as an escaped quote, so literal boundaries would no longer be
/// the ones scanned here.
pub fn has_balanced_parentheses(clause: &str) -> bool {
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;

    for c in clause.chars() {
        match (quote, c) {
            (_, '\\') => return false,
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            (None, _) => {}
        }
    }

    depth == 0 && quote.is_none()
}

/// Validated view of the inbound search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub start: u32,
    pub size: u32,
    pub sort: Option<String>,
    pub free_text: String,
    pub query: Vec<String>,
}

impl SearchRequest {
    pub fn from_params(params: &QueryParams) -> Result<Self, SearchError> {
        let start = parse_count(params, "start", DEFAULT_START)?;
        let size = parse_count(params, "size", DEFAULT_SIZE)?;

        let query = params.get_all(QUERY_PARAM).to_vec();
        if let Some(bad) = query.iter().find(|q| !has_balanced_parentheses(q)) {
            return Err(SearchError::InvalidParameter {
                name: QUERY_PARAM,
                value: bad.clone(),
            });
        }

        Ok(Self {
            start,
            size,
            sort: params.get("sort").map(str::to_string),
            free_text: params
                .get("freeText")
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_FREE_TEXT)
                .to_string(),
            query,
        })
    }

    pub fn scoped_query(&self, tenant: &TenantId) -> String {
        scope_queries(tenant, self.query.iter().map(String::as_str))
    }
}

fn parse_count(params: &QueryParams, name: &'static str, default: u32) -> Result<u32, SearchError> {
    match params.get(name).map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse().map_err(|_| SearchError::InvalidParameter {
            name,
            value: raw.to_string(),
        }),
    }
}
