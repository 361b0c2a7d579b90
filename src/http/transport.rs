//! Transport provisioning for authenticated management calls.

// std
use std::sync::OnceLock;
// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, header::AUTHORIZATION};
use reqwest::{Client, redirect::Policy};
use serde::{Deserialize, Serialize};
// self
use crate::{_prelude::*, ConfigError, credentials::Credentials, security::ApiKey};

/// Client version advertised in the `Passage-Version` header.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Header carrying the client version.
pub const PASSAGE_VERSION_HEADER: &str = "passage-version";
/// Default size guard for JWKS documents (1 MiB).
pub const DEFAULT_MAX_KEY_SET_BYTES: u64 = 1_048_576;

/// Settings applied when the crate builds its own HTTP clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
	/// Value of the `Passage-Version` header.
	#[serde(default = "default_client_version")]
	pub client_version: String,
	/// TCP connect timeout; unbounded when unset.
	#[serde(default)]
	pub connect_timeout: Option<Duration>,
	/// Whole-request timeout; unbounded when unset.
	#[serde(default)]
	pub request_timeout: Option<Duration>,
	/// Maximum accepted JWKS document size in bytes.
	#[serde(default = "default_max_key_set_bytes")]
	pub max_key_set_bytes: u64,
}
impl TransportSettings {
	/// Validate the settings.
	pub fn validate(&self) -> Result<()> {
		if self.client_version.trim().is_empty() {
			return Err(ConfigError::Invalid {
				field: "transport.client_version",
				reason: "Must not be empty.".into(),
			}
			.into());
		}
		if HeaderValue::from_str(&self.client_version).is_err() {
			return Err(ConfigError::Invalid {
				field: "transport.client_version",
				reason: "Must be a valid header value.".into(),
			}
			.into());
		}
		if self.max_key_set_bytes == 0 {
			return Err(ConfigError::Invalid {
				field: "transport.max_key_set_bytes",
				reason: "Must be greater than zero.".into(),
			}
			.into());
		}

		Ok(())
	}

	/// Client builder carrying the shared defaults (user agent, redirects, timeouts).
	pub fn client_builder(&self) -> reqwest::ClientBuilder {
		let mut builder = Client::builder()
			.redirect(Policy::limited(10))
			.user_agent(format!("passage-auth/{}", self.client_version));

		if let Some(timeout) = self.connect_timeout {
			builder = builder.connect_timeout(timeout);
		}
		if let Some(timeout) = self.request_timeout {
			builder = builder.timeout(timeout);
		}

		builder
	}

	/// Build an unauthenticated client, used for public endpoints such as JWKS.
	pub fn build_public_client(&self) -> Result<Client> {
		self.client_builder().build().map_err(client_build_failed)
	}
}
impl Default for TransportSettings {
	fn default() -> Self {
		Self {
			client_version: default_client_version(),
			connect_timeout: None,
			request_timeout: None,
			max_key_set_bytes: DEFAULT_MAX_KEY_SET_BYTES,
		}
	}
}

/// Supplies the HTTP transport for management calls.
///
/// An injected client is returned as-is on every call and never modified. Without one, a client
/// carrying `Authorization` and `Passage-Version` default headers is built on first use and
/// memoized for the provider's lifetime. Concurrent first calls may each build a client; the
/// first one stored wins.
#[derive(Debug)]
pub struct TransportProvider {
	injected: Option<Client>,
	credentials: Credentials,
	settings: TransportSettings,
	built: OnceLock<Client>,
}
impl TransportProvider {
	/// Provider that builds its own authenticated client lazily.
	pub fn new(credentials: &Credentials, settings: TransportSettings) -> Self {
		Self { injected: None, credentials: credentials.clone(), settings, built: OnceLock::new() }
	}

	/// Provider that always hands out the caller's client.
	pub fn with_transport(
		credentials: &Credentials,
		client: Client,
		settings: TransportSettings,
	) -> Self {
		Self {
			injected: Some(client),
			credentials: credentials.clone(),
			settings,
			built: OnceLock::new(),
		}
	}

	/// Whether the transport was supplied by the caller.
	pub fn is_injected(&self) -> bool {
		self.injected.is_some()
	}

	/// Settings used for self-constructed clients.
	pub fn settings(&self) -> &TransportSettings {
		&self.settings
	}

	/// Resolve the transport, building it on first use.
	///
	/// Fails with [`ConfigError::MissingSecret`] when no client was injected and no API key is
	/// configured.
	pub fn transport(&self) -> Result<Client> {
		if let Some(client) = &self.injected {
			return Ok(client.clone());
		}
		if let Some(client) = self.built.get() {
			return Ok(client.clone());
		}

		let client = self.build_authenticated(self.credentials.require_api_key()?)?;

		tracing::debug!(version = %self.settings.client_version, "built authenticated transport");

		Ok(self.built.get_or_init(|| client).clone())
	}

	fn build_authenticated(&self, api_key: &ApiKey) -> Result<Client> {
		let mut headers = HeaderMap::with_capacity(2);
		let version = HeaderValue::from_str(&self.settings.client_version).map_err(|err| {
			ConfigError::Invalid {
				field: "transport.client_version",
				reason: format!("Cannot be used as a header value: {err}."),
			}
		})?;

		headers.insert(AUTHORIZATION, api_key.bearer_header()?);
		headers.insert(HeaderName::from_static(PASSAGE_VERSION_HEADER), version);

		self.settings.client_builder().default_headers(headers).build().map_err(client_build_failed)
	}
}

fn client_build_failed(err: reqwest::Error) -> Error {
	ConfigError::Invalid {
		field: "transport",
		reason: format!("Failed to construct HTTP client: {err}."),
	}
	.into()
}

fn default_client_version() -> String {
	CLIENT_VERSION.to_owned()
}

fn default_max_key_set_bytes() -> u64 {
	DEFAULT_MAX_KEY_SET_BYTES
}
