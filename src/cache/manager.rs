//! Key set cache coordinating JWKS retrieval for one tenant.

// crates.io
use jsonwebtoken::jwk::JwkSet;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use url::Url;
// self
use crate::{
	_prelude::*,
	cache::{
		entry::{CacheEntry, RefreshPolicy},
		state::{CacheState, KeySetPayload},
	},
	http::{client::fetch_key_set, endpoints::Routes, transport::TransportSettings},
	metrics::{self, KeySetMetrics},
};

/// Lazily loaded, shareable JWKS cache for one application.
///
/// The first call to [`KeySetCache::key_set`] downloads the tenant's key set; concurrent first
/// callers share that single download. Failed downloads leave the cache empty so the next call
/// tries again. Clones share the same cache.
#[derive(Clone, Debug)]
pub struct KeySetCache {
	app_id: Arc<str>,
	url: Arc<Url>,
	client: Client,
	max_bytes: u64,
	policy: RefreshPolicy,
	entry: Arc<RwLock<CacheEntry>>,
	single_flight: Arc<Mutex<()>>,
	metrics: Arc<KeySetMetrics>,
}
impl KeySetCache {
	/// Build a cache that downloads keys with its own unauthenticated client.
	pub fn new(routes: &Routes, settings: &TransportSettings, policy: RefreshPolicy) -> Result<Self> {
		policy.validate()?;

		let client = settings.build_public_client()?;

		Ok(Self::with_client(routes, client, settings, policy))
	}

	/// Build a cache that downloads keys through the supplied client.
	pub fn with_client(
		routes: &Routes,
		client: Client,
		settings: &TransportSettings,
		policy: RefreshPolicy,
	) -> Self {
		Self {
			app_id: Arc::from(routes.app_id()),
			url: Arc::new(routes.jwks()),
			client,
			max_bytes: settings.max_key_set_bytes,
			policy,
			entry: Arc::new(RwLock::new(CacheEntry::new())),
			single_flight: Arc::new(Mutex::new(())),
			metrics: KeySetMetrics::new(),
		}
	}

	/// JWKS endpoint this cache reads from.
	pub fn jwks_url(&self) -> &Url {
		&self.url
	}

	/// Refresh policy in effect.
	pub fn policy(&self) -> &RefreshPolicy {
		&self.policy
	}

	/// Access the per-cache metrics accumulator.
	pub fn metrics(&self) -> Arc<KeySetMetrics> {
		self.metrics.clone()
	}

	/// Number of successful downloads performed so far.
	pub fn fetch_count(&self) -> u64 {
		self.metrics.snapshot().fetches
	}

	/// Current cache state, for status reporting.
	pub async fn snapshot(&self) -> CacheState {
		self.entry.read().await.state().clone()
	}

	/// Drop the cached key set; the next lookup downloads it again.
	pub async fn invalidate(&self) {
		self.entry.write().await.invalidate();

		tracing::debug!(app_id = %self.app_id, "key set invalidated");
	}

	/// Return the cached key set, downloading it when none is usable.
	#[tracing::instrument(skip(self), fields(app_id = %self.app_id))]
	pub async fn key_set(&self) -> Result<Arc<JwkSet>> {
		if let Some(jwks) = self.cached(Instant::now()).await {
			self.observe_hit();

			return Ok(jwks);
		}

		let _guard = self.single_flight.lock().await;

		// Another caller may have finished loading while this one waited.
		if let Some(jwks) = self.cached(Instant::now()).await {
			self.observe_hit();

			return Ok(jwks);
		}

		tracing::debug!("key set not cached; fetching");

		self.load().await
	}

	/// Re-download the key set because a token named `kid`, which the cached set lacks.
	///
	/// Returns `Ok(None)` when the refresh policy does not allow a re-fetch right now, or when the
	/// re-fetch failed while a previously loaded set is still cached. Every attempt restarts the
	/// miss cooldown.
	#[tracing::instrument(skip(self), fields(app_id = %self.app_id))]
	pub async fn refetch_for_unknown_kid(&self, kid: &str) -> Result<Option<Arc<JwkSet>>> {
		if !self.policy.refetch_on_unknown_kid {
			return Ok(None);
		}

		let _guard = self.single_flight.lock().await;
		let now = Instant::now();

		let has_fallback = {
			let mut entry = self.entry.write().await;

			if let Some(payload) = entry.fresh(&self.policy, now)
				&& payload.contains_kid(kid)
			{
				return Ok(Some(payload.jwks.clone()));
			}
			if !entry.may_refetch_for_miss(&self.policy, now) {
				tracing::debug!("unknown key id inside cooldown; not refetching");

				return Ok(None);
			}

			entry.mark_miss_refetch(now);

			entry.state().is_ready()
		};

		tracing::debug!("unknown key id; refetching key set");

		match self.load().await {
			Ok(jwks) => Ok(Some(jwks)),
			Err(err) if has_fallback => {
				tracing::debug!(error = %err, "refetch failed; keeping cached key set");

				Ok(None)
			},
			Err(err) => Err(err),
		}
	}

	async fn cached(&self, now: Instant) -> Option<Arc<JwkSet>> {
		self.entry.read().await.fresh(&self.policy, now).map(|payload| payload.jwks.clone())
	}

	async fn load(&self) -> Result<Arc<JwkSet>> {
		let started = Instant::now();

		match fetch_key_set(&self.client, &self.url, self.max_bytes).await {
			Ok(jwks) => {
				let payload = KeySetPayload::new(jwks.clone(), Instant::now());

				self.entry.write().await.load_success(payload);
				self.observe_fetch_success(started.elapsed());

				Ok(jwks)
			},
			Err(err) => {
				self.observe_fetch_error();

				tracing::warn!(error = %err, "key set fetch failed");

				Err(err)
			},
		}
	}

	fn observe_hit(&self) {
		metrics::record_key_set_hit(&self.app_id);

		self.metrics.record_hit();
	}

	fn observe_fetch_success(&self, duration: Duration) {
		metrics::record_key_set_fetch(&self.app_id, true, duration);

		self.metrics.record_fetch_success(duration);
	}

	fn observe_fetch_error(&self) {
		metrics::record_key_set_fetch(&self.app_id, false, Duration::ZERO);

		self.metrics.record_fetch_error();
	}
}
