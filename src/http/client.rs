//! HTTP client integration for JWKS retrieval and transport failures.

// crates.io
use http::{StatusCode, header::ACCEPT};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::Client;
use serde::Deserialize;
use url::Url;
// self
use crate::_prelude::*;

/// Raw transport failure, before classification by the façade boundary.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
	/// The provider answered with a non-success status.
	#[error("Upstream HTTP status {status}: {body:?}")]
	Status {
		/// Status returned by the provider.
		status: StatusCode,
		/// Response body, if any.
		body: Option<String>,
	},
	/// The request could not be sent or the response could not be read.
	#[error(transparent)]
	Request(#[from] reqwest::Error),
	/// The response body did not match the expected shape.
	#[error(transparent)]
	Decode(#[from] serde_json::Error),
}
impl TransportError {
	/// Provider status, when the failure came from a response.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Request(err) => err.status(),
			Self::Decode(_) => None,
		}
	}
}

/// JWKS document; a missing `keys` member is treated as an empty set.
#[derive(Debug, Deserialize)]
struct KeySetDocument {
	#[serde(default)]
	keys: Vec<Jwk>,
}

/// Download and parse the JWKS document at `url`.
///
/// The request carries no credentials. Non-success statuses, empty or oversized bodies, and
/// unparseable documents all surface as [`Error::KeyFetchFailed`].
pub async fn fetch_key_set(client: &Client, url: &Url, max_bytes: u64) -> Result<Arc<JwkSet>> {
	let start = Instant::now();
	let response = client
		.get(url.clone())
		.header(ACCEPT, "application/json")
		.send()
		.await
		.map_err(|err| key_fetch_failed(url, "Request failed.", Some(err.into())))?;
	let status = response.status();

	if !status.is_success() {
		let body = response.text().await.ok().filter(|body| !body.is_empty());

		return Err(key_fetch_failed(
			url,
			format!("Upstream returned HTTP {status}."),
			Some(TransportError::Status { status, body }),
		));
	}

	if let Some(declared) = response.content_length()
		&& declared > max_bytes
	{
		return Err(oversized(url, "Declared response size", declared, max_bytes));
	}

	let bytes = response
		.bytes()
		.await
		.map_err(|err| key_fetch_failed(url, "Failed to read response body.", Some(err.into())))?;

	if bytes.is_empty() {
		return Err(key_fetch_failed(url, "Response body is empty.", None));
	}
	if bytes.len() as u64 > max_bytes {
		return Err(oversized(url, "Response size", bytes.len() as u64, max_bytes));
	}

	let document: KeySetDocument = serde_json::from_slice(&bytes).map_err(|err| {
		key_fetch_failed(url, "Response is not a JWKS document.", Some(err.into()))
	})?;

	tracing::debug!(
		%url,
		status = %status,
		keys = document.keys.len(),
		elapsed = ?start.elapsed(),
		"jwks fetch complete"
	);

	Ok(Arc::new(JwkSet { keys: document.keys }))
}

fn oversized(url: &Url, what: &str, size: u64, max_bytes: u64) -> Error {
	key_fetch_failed(
		url,
		format!("{what} {size} bytes exceeds the configured guard of {max_bytes} bytes."),
		None,
	)
}

fn key_fetch_failed(
	url: &Url,
	reason: impl Into<String>,
	source: Option<TransportError>,
) -> Error {
	Error::KeyFetchFailed { url: url.clone(), reason: reason.into(), source }
}
