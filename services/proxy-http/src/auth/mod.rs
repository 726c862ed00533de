mod context;
mod error;
mod middleware;

pub use context::{TenantContext, TenantId};
pub use error::AuthError;
pub use middleware::TenantAuthenticator;
