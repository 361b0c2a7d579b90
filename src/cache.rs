//! Per-tenant JWKS cache.

pub mod entry;
pub mod manager;
pub mod state;

pub use self::{
	entry::{CacheEntry, RefreshPolicy},
	manager::KeySetCache,
	state::{CacheState, KeySetPayload},
};
