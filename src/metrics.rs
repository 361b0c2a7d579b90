//! Metrics helpers and per-cache telemetry bookkeeping.
//!
//! The `record_*` functions forward to the global `metrics` recorder when the `metrics` feature is
//! enabled and compile to nothing otherwise. [`KeySetMetrics`] is always available.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;
#[cfg(feature = "metrics")] pub use recorder::*;
#[cfg(not(feature = "metrics"))] pub use noop::*;

/// Thread-safe counters for a single key set cache.
#[derive(Debug, Default)]
pub struct KeySetMetrics {
	hits: AtomicU64,
	fetches: AtomicU64,
	fetch_errors: AtomicU64,
	last_fetch_micros: AtomicU64,
}
impl KeySetMetrics {
	/// Create a new metrics accumulator.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Record a lookup served from the cache.
	pub fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	/// Record a successful download and its latency.
	pub fn record_fetch_success(&self, duration: Duration) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
		self.last_fetch_micros
			.store(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX), Ordering::Relaxed);
	}

	/// Record a failed download.
	pub fn record_fetch_error(&self) {
		self.fetch_errors.fetch_add(1, Ordering::Relaxed);
	}

	/// Take a point-in-time snapshot for status reporting.
	pub fn snapshot(&self) -> KeySetMetricsSnapshot {
		KeySetMetricsSnapshot {
			hits: self.hits.load(Ordering::Relaxed),
			fetches: self.fetches.load(Ordering::Relaxed),
			fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
			last_fetch_micros: match self.last_fetch_micros.load(Ordering::Relaxed) {
				0 => None,
				value => Some(value),
			},
		}
	}
}

/// Read-only snapshot of [`KeySetMetrics`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySetMetricsSnapshot {
	/// Lookups served without a download.
	pub hits: u64,
	/// Successful downloads.
	pub fetches: u64,
	/// Failed downloads.
	pub fetch_errors: u64,
	/// Microsecond latency of the most recent successful download.
	pub last_fetch_micros: Option<u64>,
}
impl KeySetMetricsSnapshot {
	/// Share of lookups served from the cache.
	pub fn hit_rate(&self) -> f64 {
		let total = self.hits + self.fetches;

		if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
	}
}

#[cfg(feature = "metrics")]
mod recorder {
	// crates.io
	use metrics::Label;
	use smallvec::SmallVec;
	// self
	use crate::_prelude::*;

	type LabelSet = SmallVec<[Label; 3]>;

	const METRIC_KEY_SET_HITS: &str = "passage_key_set_hits_total";
	const METRIC_KEY_SET_FETCH_TOTAL: &str = "passage_key_set_fetch_total";
	const METRIC_KEY_SET_FETCH_DURATION: &str = "passage_key_set_fetch_duration_seconds";
	const METRIC_TOKEN_VALIDATIONS: &str = "passage_token_validations_total";
	const METRIC_REMOTE_CALLS: &str = "passage_remote_calls_total";

	/// Record a key set lookup served from the cache.
	pub fn record_key_set_hit(app_id: &str) {
		metrics::counter!(METRIC_KEY_SET_HITS, app_labels(app_id).iter()).increment(1);
	}

	/// Record a key set download attempt; latency is only kept for successes.
	pub fn record_key_set_fetch(app_id: &str, success: bool, duration: Duration) {
		let mut labels = app_labels(app_id);

		labels.push(Label::new("status", status_label(success)));

		metrics::counter!(METRIC_KEY_SET_FETCH_TOTAL, labels.iter()).increment(1);

		if success {
			metrics::histogram!(METRIC_KEY_SET_FETCH_DURATION, app_labels(app_id).iter())
				.record(duration.as_secs_f64());
		}
	}

	/// Record the outcome of a token validation.
	pub fn record_token_validation(app_id: &str, success: bool) {
		let mut labels = app_labels(app_id);

		labels.push(Label::new("status", status_label(success)));

		metrics::counter!(METRIC_TOKEN_VALIDATIONS, labels.iter()).increment(1);
	}

	/// Record a management call outcome, labelled by operation and status.
	pub fn record_remote_call(operation: &'static str, outcome: &'static str) {
		let mut labels = LabelSet::with_capacity(2);

		labels.push(Label::new("operation", operation));
		labels.push(Label::new("status", outcome));

		metrics::counter!(METRIC_REMOTE_CALLS, labels.iter()).increment(1);
	}

	fn app_labels(app_id: &str) -> LabelSet {
		let mut labels = LabelSet::with_capacity(3);

		labels.push(Label::new("app_id", app_id.to_owned()));

		labels
	}

	fn status_label(success: bool) -> &'static str {
		if success { "success" } else { "error" }
	}
}

#[cfg(not(feature = "metrics"))]
#[allow(missing_docs)]
mod noop {
	// self
	use crate::_prelude::*;

	pub fn record_key_set_hit(_: &str) {}

	pub fn record_key_set_fetch(_: &str, _: bool, _: Duration) {}

	pub fn record_token_validation(_: &str, _: bool) {}

	pub fn record_remote_call(_: &'static str, _: &'static str) {}
}

#[cfg(feature = "prometheus")]
mod exporter {
	// std
	use std::sync::OnceLock;
	// crates.io
	use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
	// self
	use crate::_prelude::*;

	static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

	/// Install the default Prometheus recorder backed by `metrics`.
	///
	/// Subsequent calls become no-ops once the recorder is installed.
	pub fn install_default_exporter() -> Result<()> {
		if PROMETHEUS_HANDLE.get().is_some() {
			return Ok(());
		}

		let handle = PrometheusBuilder::new()
			.install_recorder()
			.map_err(|err| Error::Metrics(err.to_string()))?;
		let _ = PROMETHEUS_HANDLE.set(handle);

		Ok(())
	}

	/// Access the global Prometheus exporter handle when installed.
	pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
		PROMETHEUS_HANDLE.get()
	}
}
#[cfg(feature = "prometheus")] pub use exporter::{install_default_exporter, prometheus_handle};
