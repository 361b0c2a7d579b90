//! Tenant identity and secret resolution.

// self
use crate::{_prelude::*, ConfigError, config::TenantConfig, security::ApiKey};

/// Validated tenant identity plus the optional management secret.
///
/// Resolution fails immediately when the application identifier is missing. A missing API key is
/// tolerated until an operation actually needs an authenticated transport, so validation-only
/// clients can run without one.
#[derive(Clone, Debug)]
pub struct Credentials {
	app_id: Arc<str>,
	api_key: Option<ApiKey>,
}
impl Credentials {
	/// Resolve credentials from a tenant configuration.
	pub fn resolve(config: &TenantConfig) -> Result<Self> {
		let app_id = config.app_id.trim();

		if app_id.is_empty() {
			return Err(ConfigError::MissingTenantId.into());
		}

		let api_key = config.api_key.clone().filter(|key| !key.is_blank());

		Ok(Self { app_id: Arc::from(app_id), api_key })
	}

	/// Passage application identifier.
	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// API key, if one was configured.
	pub fn api_key(&self) -> Option<&ApiKey> {
		self.api_key.as_ref()
	}

	/// API key, or the deferred [`ConfigError::MissingSecret`].
	pub fn require_api_key(&self) -> Result<&ApiKey> {
		self.api_key.as_ref().ok_or_else(|| ConfigError::MissingSecret.into())
	}
}
