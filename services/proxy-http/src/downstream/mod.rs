mod client;
mod error;
mod middleware;
mod params;

pub use client::{DownstreamClient, DownstreamResponse};
pub use error::DownstreamError;
pub use middleware::{ClientMiddleware, MiddlewareChain, OutboundCall, RequestLogging};
pub use params::{copy_parameters, InvalidEncoding, QueryParams};
