//! User façade.

// crates.io
use reqwest::Client;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	config::TenantConfig,
	http::api::IDENTIFIER_LOOKUP_LIMIT,
	normalize::{CallError, Operation},
	resource::{
		ResourceClient,
		model::{CreateUserRequest, UpdateUserRequest, UserInfo},
	},
};

/// User management operations.
#[async_trait::async_trait]
pub trait UserOperations: Send + Sync {
	/// Fetch a user by id.
	async fn get(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo>;

	/// Fetch the single user registered with `identifier` (email address or phone number).
	///
	/// Zero matches and ambiguous matches both fail with [`Error::NotFound`].
	async fn get_by_identifier(
		&self,
		identifier: &str,
		cancel: &CancellationToken,
	) -> Result<UserInfo>;

	/// Create a user.
	async fn create(
		&self,
		request: &CreateUserRequest,
		cancel: &CancellationToken,
	) -> Result<UserInfo>;

	/// Update a user's attributes.
	async fn update(
		&self,
		user_id: &str,
		request: &UpdateUserRequest,
		cancel: &CancellationToken,
	) -> Result<UserInfo>;

	/// Delete a user.
	async fn delete(&self, user_id: &str, cancel: &CancellationToken) -> Result<()>;

	/// Activate a user.
	async fn activate(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo>;

	/// Deactivate a user.
	async fn deactivate(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo>;
}

/// User façade over the management API.
#[derive(Clone, Debug)]
pub struct User {
	inner: Arc<ResourceClient>,
}
impl User {
	/// Build a façade that authenticates with the configured API key.
	pub fn new(config: &TenantConfig) -> Result<Self> {
		Ok(Self::from_shared(Arc::new(ResourceClient::new(config)?)))
	}

	/// Build a façade that sends every request through `client` unchanged.
	pub fn with_transport(config: &TenantConfig, client: Client) -> Result<Self> {
		Ok(Self::from_shared(Arc::new(ResourceClient::with_transport(config, client)?)))
	}

	pub(crate) fn from_shared(inner: Arc<ResourceClient>) -> Self {
		Self { inner }
	}

	/// Application the façade is bound to.
	pub fn app_id(&self) -> &str {
		self.inner.app_id()
	}
}
#[async_trait::async_trait]
impl UserOperations for User {
	async fn get(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo> {
		self.inner
			.call(Operation::GetUser, cancel, |api| async move {
				api.get_user(user_id).await.map_err(CallError::from)
			})
			.await
	}

	async fn get_by_identifier(
		&self,
		identifier: &str,
		cancel: &CancellationToken,
	) -> Result<UserInfo> {
		self.inner
			.call(Operation::GetUserByIdentifier, cancel, |api| async move {
				let mut matches = api
					.list_users_by_identifier(identifier, IDENTIFIER_LOOKUP_LIMIT)
					.await
					.map_err(CallError::from)?;

				if matches.len() != 1 {
					tracing::debug!(matches = matches.len(), "identifier lookup is not unique");

					return Err(CallError::from(Error::NotFound {
						identifier: identifier.to_owned(),
					}));
				}

				let user_id = matches.swap_remove(0).id;

				api.get_user(&user_id).await.map_err(CallError::from)
			})
			.await
	}

	async fn create(
		&self,
		request: &CreateUserRequest,
		cancel: &CancellationToken,
	) -> Result<UserInfo> {
		self.inner
			.call(Operation::CreateUser, cancel, |api| async move {
				api.create_user(request).await.map_err(CallError::from)
			})
			.await
	}

	async fn update(
		&self,
		user_id: &str,
		request: &UpdateUserRequest,
		cancel: &CancellationToken,
	) -> Result<UserInfo> {
		self.inner
			.call(Operation::UpdateUser, cancel, |api| async move {
				api.update_user(user_id, request).await.map_err(CallError::from)
			})
			.await
	}

	async fn delete(&self, user_id: &str, cancel: &CancellationToken) -> Result<()> {
		self.inner
			.call(Operation::DeleteUser, cancel, |api| async move {
				api.delete_user(user_id).await.map_err(CallError::from)
			})
			.await
	}

	async fn activate(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo> {
		self.inner
			.call(Operation::ActivateUser, cancel, |api| async move {
				api.activate_user(user_id).await.map_err(CallError::from)
			})
			.await
	}

	async fn deactivate(&self, user_id: &str, cancel: &CancellationToken) -> Result<UserInfo> {
		self.inner
			.call(Operation::DeactivateUser, cancel, |api| async move {
				api.deactivate_user(user_id).await.map_err(CallError::from)
			})
			.await
	}
}
