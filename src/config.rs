//! Tenant configuration and validation.
//!
//! A [`TenantConfig`] is deserialisable so hosts can embed it in their own configuration files;
//! locating and loading those files is left to the host.

// crates.io
use serde::{Deserialize, Serialize};
use url::Url;
// self
use crate::{
	_prelude::*,
	cache::RefreshPolicy,
	http::transport::TransportSettings,
	security::{self, ApiKey},
	token::ValidationPolicy,
};

/// Where callers are expected to present Passage tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
	/// Token arrives in the `psg_auth_token` cookie.
	#[default]
	Cookie,
	/// Token arrives in an `Authorization: Bearer` header.
	Header,
}

/// Configuration for one Passage application (tenant).
#[derive(Clone, Debug, Deserialize)]
pub struct TenantConfig {
	/// Passage application identifier.
	#[serde(default)]
	pub app_id: String,
	/// API key for management operations; validation-only clients may omit it.
	#[serde(default)]
	pub api_key: Option<ApiKey>,
	/// Where inbound requests carry their token.
	#[serde(default)]
	pub auth_strategy: AuthStrategy,
	/// Override for the management API base (defaults to `https://api.passage.id/v1`).
	#[serde(default)]
	pub api_base: Option<Url>,
	/// Override for the JWKS host base (defaults to `https://auth.passage.id/v1`).
	///
	/// The expected token issuer is not affected by this override.
	#[serde(default)]
	pub auth_base: Option<Url>,
	/// Whether endpoint overrides must use HTTPS.
	#[serde(default = "default_true")]
	pub require_https: bool,
	/// Signing key cache refresh behaviour.
	#[serde(default)]
	pub key_refresh: RefreshPolicy,
	/// Token validation tolerances.
	#[serde(default)]
	pub validation: ValidationPolicy,
	/// Settings for the self-constructed HTTP transport.
	#[serde(default)]
	pub transport: TransportSettings,
}
impl TenantConfig {
	/// Create a configuration with defaults for everything but the application identifier.
	pub fn new(app_id: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			api_key: None,
			auth_strategy: AuthStrategy::default(),
			api_base: None,
			auth_base: None,
			require_https: true,
			key_refresh: RefreshPolicy::default(),
			validation: ValidationPolicy::default(),
			transport: TransportSettings::default(),
		}
	}

	/// Attach the API key used for management operations.
	pub fn with_api_key(mut self, api_key: impl Into<ApiKey>) -> Self {
		self.api_key = Some(api_key.into());

		self
	}

	/// Select where inbound tokens are read from.
	pub fn with_auth_strategy(mut self, auth_strategy: AuthStrategy) -> Self {
		self.auth_strategy = auth_strategy;

		self
	}

	/// Point management calls at a different API base.
	pub fn with_api_base(mut self, api_base: impl AsRef<str>) -> Result<Self> {
		self.api_base = Some(parse_url("api_base", api_base.as_ref())?);

		Ok(self)
	}

	/// Point JWKS downloads at a different host base.
	pub fn with_auth_base(mut self, auth_base: impl AsRef<str>) -> Result<Self> {
		self.auth_base = Some(parse_url("auth_base", auth_base.as_ref())?);

		Ok(self)
	}

	/// Set HTTPS requirement for endpoint overrides.
	pub fn with_require_https(mut self, require_https: bool) -> Self {
		self.require_https = require_https;

		self
	}

	/// Replace the signing key refresh policy.
	pub fn with_key_refresh(mut self, key_refresh: RefreshPolicy) -> Self {
		self.key_refresh = key_refresh;

		self
	}

	/// Replace the token validation policy.
	pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
		self.validation = validation;

		self
	}

	/// Validate everything except the tenant identity, which [`crate::Credentials`] owns.
	pub fn validate(&self) -> Result<()> {
		for (field, url) in [("api_base", &self.api_base), ("auth_base", &self.auth_base)] {
			if let Some(url) = url {
				security::ensure_base_url(field, url)?;

				if self.require_https {
					security::enforce_https(field, url)?;
				}
			}
		}

		self.key_refresh.validate()?;
		self.validation.validate()?;
		self.transport.validate()?;

		Ok(())
	}
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|err| {
		crate::ConfigError::Invalid { field, reason: format!("Invalid URL '{raw}': {err}.") }
			.into()
	})
}

fn default_true() -> bool {
	true
}
