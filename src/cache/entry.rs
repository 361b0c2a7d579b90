//! Cache entry and refresh policy.

// crates.io
use serde::{Deserialize, Serialize};
// self
use crate::{
	_prelude::*,
	ConfigError,
	cache::state::{CacheState, KeySetPayload},
};

/// Default minimum spacing between re-fetches triggered by an unknown `kid`.
pub const DEFAULT_MISS_COOLDOWN: Duration = Duration::from_secs(30);

/// When a cached key set may be replaced.
///
/// The default keeps the first successfully loaded key set for the cache's lifetime and never
/// re-fetches on an unknown `kid`. `max_age` turns on time-based expiry; `refetch_on_unknown_kid`
/// allows one re-fetch per `miss_cooldown` when a token names a key the cache does not hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
	/// Maximum age of a cached key set.
	#[serde(default)]
	pub max_age: Option<Duration>,
	/// Re-fetch once when a token's `kid` is missing from the cached set.
	#[serde(default)]
	pub refetch_on_unknown_kid: bool,
	/// Minimum spacing between a load and a miss-triggered re-fetch.
	#[serde(default = "default_miss_cooldown")]
	pub miss_cooldown: Duration,
}
impl RefreshPolicy {
	/// Policy that expires key sets after `max_age`.
	pub fn with_max_age(mut self, max_age: Duration) -> Self {
		self.max_age = Some(max_age);

		self
	}

	/// Policy that re-fetches on unknown `kid`, at most once per `cooldown`.
	pub fn with_refetch_on_unknown_kid(mut self, cooldown: Duration) -> Self {
		self.refetch_on_unknown_kid = true;
		self.miss_cooldown = cooldown;

		self
	}

	/// Validate invariants for the policy.
	pub fn validate(&self) -> Result<()> {
		if let Some(max_age) = self.max_age
			&& max_age < Duration::from_secs(1)
		{
			return Err(ConfigError::Invalid {
				field: "key_refresh.max_age",
				reason: "Must be at least 1 second.".into(),
			}
			.into());
		}

		Ok(())
	}
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self { max_age: None, refetch_on_unknown_kid: false, miss_cooldown: DEFAULT_MISS_COOLDOWN }
	}
}

/// Cached key set for one tenant.
#[derive(Clone, Debug, Default)]
pub struct CacheEntry {
	state: CacheState,
	last_miss_refetch: Option<Instant>,
}
impl CacheEntry {
	/// Create a new empty cache entry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inspect the current cache state.
	pub fn state(&self) -> &CacheState {
		&self.state
	}

	/// Record a successful load, replacing any previous payload.
	pub fn load_success(&mut self, payload: KeySetPayload) {
		self.state = CacheState::Ready(payload);
	}

	/// Drop the cached payload.
	pub fn invalidate(&mut self) {
		self.state = CacheState::Empty;
	}

	/// Payload that is still usable under `policy`.
	pub fn fresh(&self, policy: &RefreshPolicy, now: Instant) -> Option<&KeySetPayload> {
		self.state.payload().filter(|payload| !payload.is_expired(policy, now))
	}

	/// Record that an unknown `kid` triggered a re-fetch, whatever its outcome.
	pub fn mark_miss_refetch(&mut self, now: Instant) {
		self.last_miss_refetch = Some(now);
	}

	/// Whether an unknown `kid` may trigger a re-fetch right now.
	///
	/// The cooldown runs from the later of the last successful load and the last miss-triggered
	/// attempt.
	pub fn may_refetch_for_miss(&self, policy: &RefreshPolicy, now: Instant) -> bool {
		if !policy.refetch_on_unknown_kid {
			return false;
		}

		let loaded_at = self.state.payload().map(|payload| payload.loaded_at);

		match loaded_at.max(self.last_miss_refetch) {
			Some(last) => now.saturating_duration_since(last) >= policy.miss_cooldown,
			None => true,
		}
	}
}

fn default_miss_cooldown() -> Duration {
	DEFAULT_MISS_COOLDOWN
}
