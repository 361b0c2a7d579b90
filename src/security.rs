//! Secret handling and transport hardening helpers.
//!
//! # Threat Model
//! The API key grants full management access to a Passage application. It must never reach logs,
//! debug output, or unauthenticated endpoints such as the public JWKS document. Endpoint
//! overrides are checked for HTTPS so that a misconfiguration cannot downgrade the bearer header
//! to plaintext.

// std
use std::fmt::{Debug, Formatter, Result as FmtResult};
// crates.io
use http::HeaderValue;
use serde::Deserialize;
use url::Url;
// self
use crate::{_prelude::*, error::ConfigError};

/// Passage API key; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);
impl ApiKey {
	/// Wrap a raw API key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Whether the key holds no usable characters.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Reveal the raw key; only transport construction should need this.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Build the `Authorization: Bearer` header value, marked sensitive so it is never logged.
	pub fn bearer_header(&self) -> Result<HeaderValue> {
		let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0.trim())).map_err(
			|err| ConfigError::Invalid {
				field: "api_key",
				reason: format!("Cannot be used as a header value: {err}."),
			},
		)?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl Debug for ApiKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str("ApiKey(**redacted**)")
	}
}
impl From<&str> for ApiKey {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for ApiKey {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

/// Ensure the provided URL uses HTTPS.
pub fn enforce_https(field: &'static str, url: &Url) -> Result<()> {
	if url.scheme() == "https" {
		Ok(())
	} else {
		Err(ConfigError::Invalid { field, reason: format!("Upstream URL {url} must use HTTPS.") }
			.into())
	}
}

/// Ensure the URL can serve as a base for path segments (`http`/`https` with a host).
pub fn ensure_base_url(field: &'static str, url: &Url) -> Result<()> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::Invalid {
			field,
			reason: format!("Unsupported scheme '{}'.", url.scheme()),
		}
		.into());
	}
	if url.host_str().is_none() {
		return Err(
			ConfigError::Invalid { field, reason: "Must include a host component.".into() }.into()
		);
	}

	Ok(())
}
