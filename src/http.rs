//! HTTP plumbing: transport provisioning, endpoint layout, JWKS retrieval, and management calls.

pub mod client;
pub mod endpoints;
pub mod transport;

pub(crate) mod api;
