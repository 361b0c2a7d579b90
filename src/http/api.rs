//! Typed requests against the Passage management API.
//!
//! Every method issues exactly one request and reports raw [`TransportError`]s; classification
//! into the crate taxonomy happens in the façades.

// crates.io
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
// self
use crate::{
	_prelude::*,
	http::{client::TransportError, endpoints::Routes},
	resource::model::{AppInfo, CreateUserRequest, UpdateUserRequest, UserInfo, UserSummary},
};

/// Page size used for identifier lookups; two is enough to detect ambiguity.
pub const IDENTIFIER_LOOKUP_LIMIT: usize = 2;

#[derive(Debug, Default, Deserialize)]
struct AppEnvelope {
	#[serde(default)]
	app: AppInfo,
}

#[derive(Debug, Default, Deserialize)]
struct UserEnvelope {
	#[serde(default)]
	user: UserInfo,
}

#[derive(Debug, Default, Deserialize)]
struct UserListEnvelope {
	#[serde(default)]
	users: Vec<UserSummary>,
}

/// One-request-per-method client bound to an application's routes.
#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
	http: Client,
	routes: Arc<Routes>,
}
impl ApiClient {
	pub(crate) fn new(http: Client, routes: Arc<Routes>) -> Self {
		Self { http, routes }
	}

	pub(crate) async fn get_app(&self) -> Result<AppInfo, TransportError> {
		let envelope: AppEnvelope = self.fetch(self.http.get(self.routes.app())).await?;

		Ok(envelope.app)
	}

	pub(crate) async fn get_user(&self, user_id: &str) -> Result<UserInfo, TransportError> {
		let envelope: UserEnvelope = self.fetch(self.http.get(self.routes.user(user_id))).await?;

		Ok(envelope.user)
	}

	pub(crate) async fn list_users_by_identifier(
		&self,
		identifier: &str,
		limit: usize,
	) -> Result<Vec<UserSummary>, TransportError> {
		let limit = limit.to_string();
		let request = self
			.http
			.get(self.routes.users())
			.query(&[("identifier", identifier), ("limit", limit.as_str())]);
		let envelope: UserListEnvelope = self.fetch(request).await?;

		Ok(envelope.users)
	}

	pub(crate) async fn create_user(
		&self,
		request: &CreateUserRequest,
	) -> Result<UserInfo, TransportError> {
		let envelope: UserEnvelope =
			self.fetch(self.http.post(self.routes.users()).json(request)).await?;

		Ok(envelope.user)
	}

	pub(crate) async fn update_user(
		&self,
		user_id: &str,
		request: &UpdateUserRequest,
	) -> Result<UserInfo, TransportError> {
		let envelope: UserEnvelope =
			self.fetch(self.http.patch(self.routes.user(user_id)).json(request)).await?;

		Ok(envelope.user)
	}

	pub(crate) async fn delete_user(&self, user_id: &str) -> Result<(), TransportError> {
		self.send(self.http.delete(self.routes.user(user_id))).await.map(drop)
	}

	pub(crate) async fn activate_user(&self, user_id: &str) -> Result<UserInfo, TransportError> {
		self.user_action(user_id, "activate").await
	}

	pub(crate) async fn deactivate_user(&self, user_id: &str) -> Result<UserInfo, TransportError> {
		self.user_action(user_id, "deactivate").await
	}

	pub(crate) async fn revoke_refresh_tokens(&self, user_id: &str) -> Result<(), TransportError> {
		self.send(self.http.delete(self.routes.user_action(user_id, "tokens"))).await.map(drop)
	}

	async fn user_action(&self, user_id: &str, action: &str) -> Result<UserInfo, TransportError> {
		let envelope: UserEnvelope =
			self.fetch(self.http.patch(self.routes.user_action(user_id, action))).await?;

		Ok(envelope.user)
	}

	async fn fetch<T>(&self, request: RequestBuilder) -> Result<T, TransportError>
	where
		T: DeserializeOwned,
	{
		let response = self.send(request).await?;
		let bytes = response.bytes().await?;
		// Some endpoints answer 2xx with no body; decode those as an empty object.
		let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };

		Ok(serde_json::from_slice(body)?)
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
		let response = request.send().await?;
		let status = response.status();

		if !status.is_success() {
			let url = response.url().clone();
			let body = response.text().await.ok().filter(|body| !body.is_empty());

			tracing::debug!(%status, %url, "management call rejected");

			return Err(TransportError::Status { status, body });
		}

		Ok(response)
	}
}
