//! App, user and session façades.
//!
//! Each resource kind is exposed as a capability trait plus a concrete type. The concrete types
//! built by a [`Passage`](crate::Passage) aggregate share one set of credentials, routes and
//! transport, so at most one authenticated HTTP client is built per aggregate.

pub mod app;
pub mod model;
pub mod session;
pub mod user;

pub use self::{
	app::{App, AppOperations},
	session::{AUTH_COOKIE, Session, SessionOperations, token_from_headers},
	user::{User, UserOperations},
};

// crates.io
use reqwest::Client;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	config::TenantConfig,
	credentials::Credentials,
	http::{api::ApiClient, endpoints::Routes, transport::TransportProvider},
	normalize::{self, CallError, Operation},
};

/// Tenant identity, routes and transport shared by the façades.
#[derive(Debug)]
pub(crate) struct ResourceClient {
	credentials: Credentials,
	routes: Arc<Routes>,
	transport: TransportProvider,
}
impl ResourceClient {
	pub(crate) fn new(config: &TenantConfig) -> Result<Self> {
		let credentials = Credentials::resolve(config)?;
		let transport = TransportProvider::new(&credentials, config.transport.clone());

		Self::with_provider(config, credentials, transport)
	}

	pub(crate) fn with_transport(config: &TenantConfig, client: Client) -> Result<Self> {
		let credentials = Credentials::resolve(config)?;
		let transport =
			TransportProvider::with_transport(&credentials, client, config.transport.clone());

		Self::with_provider(config, credentials, transport)
	}

	fn with_provider(
		config: &TenantConfig,
		credentials: Credentials,
		transport: TransportProvider,
	) -> Result<Self> {
		config.validate()?;

		let routes = Arc::new(Routes::from_config(config, credentials.app_id())?);

		Ok(Self { credentials, routes, transport })
	}

	pub(crate) fn app_id(&self) -> &str {
		self.credentials.app_id()
	}

	pub(crate) fn routes(&self) -> &Routes {
		&self.routes
	}

	/// Resolve the transport and run one API interaction as `operation`.
	#[tracing::instrument(skip_all, fields(app_id = %self.credentials.app_id(), %operation))]
	pub(crate) async fn call<T, F, Fut>(
		&self,
		operation: Operation,
		cancel: &CancellationToken,
		f: F,
	) -> Result<T>
	where
		F: FnOnce(ApiClient) -> Fut,
		Fut: Future<Output = Result<T, CallError>>,
	{
		normalize::call(operation, cancel, async {
			let http = self.transport.transport().map_err(CallError::from)?;

			f(ApiClient::new(http, self.routes.clone())).await
		})
		.await
	}
}
