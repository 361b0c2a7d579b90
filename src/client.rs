//! Unified Passage client.

// crates.io
use http::HeaderMap;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	config::TenantConfig,
	resource::{
		App, AppOperations, ResourceClient, Session, SessionOperations, User, UserOperations,
		model::{AppInfo, CreateUserRequest, UpdateUserRequest, UserInfo},
	},
};

/// Entry point bundling the app, user and session façades of one application.
///
/// The façades share the tenant's credentials and transport. Clones are cheap and share state,
/// including the signing key cache.
///
/// ```no_run
/// use passage_auth::{Passage, TenantConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> passage_auth::Result<()> {
/// let passage = Passage::new(&TenantConfig::new("my-app-id").with_api_key("my-api-key"))?;
/// let user_id = passage.validate_token("eyJ...", &CancellationToken::new()).await?;
/// let user = passage.get_user(&user_id, &CancellationToken::new()).await?;
///
/// println!("{}", user.email);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Passage {
	app: App,
	user: User,
	session: Session,
}
impl Passage {
	/// Build a client that authenticates management calls with the configured API key.
	///
	/// Fails when `app_id` is missing; a missing API key only fails the first management call.
	pub fn new(config: &TenantConfig) -> Result<Self> {
		Self::assemble(config, Arc::new(ResourceClient::new(config)?))
	}

	/// Build a client whose management requests go through `client` unchanged.
	///
	/// Signing keys are downloaded without `client`, so its default headers never reach the
	/// public JWKS endpoint.
	pub fn with_transport(config: &TenantConfig, client: Client) -> Result<Self> {
		Self::assemble(config, Arc::new(ResourceClient::with_transport(config, client)?))
	}

	fn assemble(config: &TenantConfig, inner: Arc<ResourceClient>) -> Result<Self> {
		let session = Session::from_shared(config, inner.clone())?;

		Ok(Self { app: App::from_shared(inner.clone()), user: User::from_shared(inner), session })
	}

	/// Application the client is bound to.
	pub fn app_id(&self) -> &str {
		self.app.app_id()
	}

	/// Application façade.
	pub fn app(&self) -> &App {
		&self.app
	}

	/// User façade.
	pub fn user(&self) -> &User {
		&self.user
	}

	/// Session façade.
	pub fn session(&self) -> &Session {
		&self.session
	}

	/// See [`SessionOperations::validate_token`].
	pub async fn validate_token(&self, token: &str, cancel: &CancellationToken) -> Result<String> {
		self.session.validate_token(token, cancel).await
	}

	/// See [`Session::authenticate_request`].
	pub async fn authenticate_request(
		&self,
		headers: &HeaderMap,
		cancel: &CancellationToken,
	) -> Result<String> {
		self.session.authenticate_request(headers, cancel).await
	}

	/// See [`AppOperations::get`].
	pub async fn get_app(&self, cancel: &CancellationToken) -> Result<AppInfo> {
		self.app.get(cancel).await
	}

	/// See [`UserOperations::get`].
	pub async fn get_user(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo> {
		self.user.get(user_id, cancel).await
	}

	/// See [`UserOperations::get_by_identifier`].
	pub async fn get_user_by_identifier(
		&self,
		identifier: &str,
		cancel: &CancellationToken,
	) -> Result<UserInfo> {
		self.user.get_by_identifier(identifier, cancel).await
	}

	/// See [`UserOperations::create`].
	pub async fn create_user(
		&self,
		request: &CreateUserRequest,
		cancel: &CancellationToken,
	) -> Result<UserInfo> {
		self.user.create(request, cancel).await
	}

	/// See [`UserOperations::update`].
	pub async fn update_user(
		&self,
		user_id: &str,
		request: &UpdateUserRequest,
		cancel: &CancellationToken,
	) -> Result<UserInfo> {
		self.user.update(user_id, request, cancel).await
	}

	/// See [`UserOperations::delete`].
	pub async fn delete_user(&self, user_id: &str, cancel: &CancellationToken) -> Result<()> {
		self.user.delete(user_id, cancel).await
	}
}
