//! Application façade.

// crates.io
use reqwest::Client;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	config::TenantConfig,
	normalize::{CallError, Operation},
	resource::{ResourceClient, model::AppInfo},
};

/// Application-level operations.
#[async_trait::async_trait]
pub trait AppOperations: Send + Sync {
	/// Fetch the application's settings.
	async fn get(&self, cancel: &CancellationToken) -> Result<AppInfo>;
}

/// Application façade over the management API.
#[derive(Clone, Debug)]
pub struct App {
	inner: Arc<ResourceClient>,
}
impl App {
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
impl AppOperations for App {
	async fn get(&self, cancel: &CancellationToken) -> Result<AppInfo> {
		self.inner
			.call(Operation::GetApp, cancel, |api| async move {
				api.get_app().await.map_err(CallError::from)
			})
			.await
	}
}
