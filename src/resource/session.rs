//! Session façade: token validation and refresh token revocation.

// crates.io
use http::{
	HeaderMap,
	header::{AUTHORIZATION, COOKIE},
};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	cache::KeySetCache,
	config::{AuthStrategy, TenantConfig},
	normalize::{self, CallError, Operation},
	resource::ResourceClient,
	token::{TokenValidator, VerificationFailure},
};

/// Cookie the Passage front-end elements store the session token in.
pub const AUTH_COOKIE: &str = "psg_auth_token";

/// Session operations.
#[async_trait::async_trait]
pub trait SessionOperations: Send + Sync {
	/// Validate `token` and return the authenticated user id.
	async fn validate_token(&self, token: &str, cancel: &CancellationToken) -> Result<String>;

	/// Revoke every refresh token issued to `user_id`.
	async fn revoke_refresh_tokens(
		&self,
		user_id: &str,
		cancel: &CancellationToken,
	) -> Result<()>;
}

/// Session façade.
///
/// Token validation needs no API key; revocation does.
#[derive(Clone, Debug)]
pub struct Session {
	inner: Arc<ResourceClient>,
	validator: TokenValidator,
	auth_strategy: AuthStrategy,
}
impl Session {
	/// Build a façade that authenticates with the configured API key.
	pub fn new(config: &TenantConfig) -> Result<Self> {
		Self::from_shared(config, Arc::new(ResourceClient::new(config)?))
	}

	/// Build a façade that sends management requests through `client`.
	///
	/// Signing keys are still downloaded with a separate unauthenticated client, so credentials
	/// carried by `client` never reach the JWKS endpoint.
	pub fn with_transport(config: &TenantConfig, client: Client) -> Result<Self> {
		Self::from_shared(config, Arc::new(ResourceClient::with_transport(config, client)?))
	}

	pub(crate) fn from_shared(config: &TenantConfig, inner: Arc<ResourceClient>) -> Result<Self> {
		let routes = inner.routes();
		let keys = KeySetCache::new(routes, &config.transport, config.key_refresh.clone())?;
		let validator = TokenValidator::with_key_set(routes, keys, config.validation.clone());

		Ok(Self { inner, validator, auth_strategy: config.auth_strategy })
	}

	/// Application the façade is bound to.
	pub fn app_id(&self) -> &str {
		self.inner.app_id()
	}

	/// Where inbound requests are expected to carry their token.
	pub fn auth_strategy(&self) -> AuthStrategy {
		self.auth_strategy
	}

	/// Validator used by [`SessionOperations::validate_token`].
	pub fn validator(&self) -> &TokenValidator {
		&self.validator
	}

	/// Extract the token from an inbound request's headers and validate it.
	///
	/// Uses the `psg_auth_token` cookie or the `Authorization: Bearer` header depending on the
	/// configured [`AuthStrategy`]. A missing token fails with
	/// [`VerificationFailure::MissingToken`].
	pub async fn authenticate_request(
		&self,
		headers: &HeaderMap,
		cancel: &CancellationToken,
	) -> Result<String> {
		let token = token_from_headers(headers, self.auth_strategy)
			.ok_or(Error::TokenVerificationFailed(VerificationFailure::MissingToken))?;

		self.validate_token(token, cancel).await
	}
}
#[async_trait::async_trait]
impl SessionOperations for Session {
	async fn validate_token(&self, token: &str, cancel: &CancellationToken) -> Result<String> {
		normalize::cancellable(Operation::ValidateToken, cancel, self.validator.validate(token))
			.await
	}

	async fn revoke_refresh_tokens(
		&self,
		user_id: &str,
		cancel: &CancellationToken,
	) -> Result<()> {
		self.inner
			.call(Operation::RevokeRefreshTokens, cancel, |api| async move {
				api.revoke_refresh_tokens(user_id).await.map_err(CallError::from)
			})
			.await
	}
}

/// Token carried by `headers` under `strategy`, if any.
pub fn token_from_headers(headers: &HeaderMap, strategy: AuthStrategy) -> Option<&str> {
	match strategy {
		AuthStrategy::Cookie => headers
			.get_all(COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(';'))
			.filter_map(|pair| pair.trim().split_once('='))
			.find_map(|(name, value)| (name == AUTH_COOKIE && !value.is_empty()).then_some(value)),
		AuthStrategy::Header => {
			let (scheme, token) = headers.get(AUTHORIZATION)?.to_str().ok()?.split_once(' ')?;
			let token = token.trim();

			(scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
		},
	}
}
