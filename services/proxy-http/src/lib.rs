//! Tenant-isolating reverse proxy for a workflow service's search API.
//!
//! Requests carry a tenant id in a trusted header. The proxy binds that
//! tenant for the lifetime of the request, rewrites the search query so it
//! can only match the tenant's workflows, forwards it downstream and streams
//! the reply back.

pub mod auth;
pub mod body;
pub mod config;
pub mod downstream;
pub mod proxy;
pub mod search;
pub mod server;
