//! Key set cache states.

// crates.io
use jsonwebtoken::jwk::JwkSet;
// self
use crate::{_prelude::*, cache::entry::RefreshPolicy};

/// A loaded key set together with when it was loaded.
#[derive(Clone, Debug)]
pub struct KeySetPayload {
	/// JWKS document downloaded for the tenant.
	pub jwks: Arc<JwkSet>,
	/// Monotonic instant of the load, used for age and cooldown checks.
	pub loaded_at: Instant,
	/// Wall-clock time of the load, for status reporting.
	pub fetched_at: DateTime<Utc>,
}
impl KeySetPayload {
	/// Wrap a freshly downloaded key set.
	pub fn new(jwks: Arc<JwkSet>, loaded_at: Instant) -> Self {
		Self { jwks, loaded_at, fetched_at: Utc::now() }
	}

	/// Time elapsed since the load.
	pub fn age(&self, now: Instant) -> Duration {
		now.saturating_duration_since(self.loaded_at)
	}

	/// Whether the payload outlived the policy's `max_age`. Never true without one.
	pub fn is_expired(&self, policy: &RefreshPolicy, now: Instant) -> bool {
		policy.max_age.is_some_and(|max_age| self.age(now) >= max_age)
	}

	/// Whether any key carries the identifier `kid`.
	pub fn contains_kid(&self, kid: &str) -> bool {
		self.jwks.keys.iter().any(|jwk| jwk.common.key_id.as_deref() == Some(kid))
	}
}

/// Cache lifecycle states.
#[derive(Clone, Debug, Default)]
pub enum CacheState {
	/// Nothing loaded yet, or the payload was invalidated.
	#[default]
	Empty,
	/// A key set is loaded.
	Ready(KeySetPayload),
}
impl CacheState {
	/// Retrieve the current payload if available.
	pub fn payload(&self) -> Option<&KeySetPayload> {
		match self {
			CacheState::Ready(payload) => Some(payload),
			CacheState::Empty => None,
		}
	}

	/// Whether a payload is loaded.
	pub fn is_ready(&self) -> bool {
		matches!(self, CacheState::Ready(_))
	}
}
