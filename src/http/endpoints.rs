//! Passage endpoint layout.

// crates.io
use url::Url;
// self
use crate::{_prelude::*, ConfigError, config::TenantConfig};

/// Production management API base.
pub const DEFAULT_API_BASE: &str = "https://api.passage.id/v1";
/// Production authentication host base, serving the JWKS documents.
pub const DEFAULT_AUTH_BASE: &str = "https://auth.passage.id/v1";
/// Prefix of every Passage token issuer; the application id is appended.
pub const ISSUER_PREFIX: &str = "https://auth.passage.id/v1/apps/";

/// URL builder for one Passage application.
#[derive(Clone, Debug)]
pub struct Routes {
	app_id: Arc<str>,
	api_base: Url,
	auth_base: Url,
}
impl Routes {
	/// Build routes for `app_id`, falling back to the production bases.
	pub fn new(app_id: &str, api_base: Option<&Url>, auth_base: Option<&Url>) -> Result<Self> {
		let api_base = match api_base {
			Some(url) => url.clone(),
			None => parse_default("api_base", DEFAULT_API_BASE)?,
		};
		let auth_base = match auth_base {
			Some(url) => url.clone(),
			None => parse_default("auth_base", DEFAULT_AUTH_BASE)?,
		};

		Ok(Self { app_id: Arc::from(app_id), api_base, auth_base })
	}

	/// Build routes from a tenant configuration and its resolved application id.
	pub fn from_config(config: &TenantConfig, app_id: &str) -> Result<Self> {
		Self::new(app_id, config.api_base.as_ref(), config.auth_base.as_ref())
	}

	/// Application identifier the routes are scoped to.
	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// Exact issuer every token for this application must carry.
	pub fn issuer(&self) -> String {
		format!("{ISSUER_PREFIX}{}", self.app_id)
	}

	/// Well-known JWKS document.
	pub fn jwks(&self) -> Url {
		join(&self.auth_base, &["apps", &self.app_id, ".well-known", "jwks.json"])
	}

	/// Application resource.
	pub fn app(&self) -> Url {
		join(&self.api_base, &["apps", &self.app_id])
	}

	/// User collection.
	pub fn users(&self) -> Url {
		join(&self.api_base, &["apps", &self.app_id, "users"])
	}

	/// Single user resource.
	pub fn user(&self, user_id: &str) -> Url {
		join(&self.api_base, &["apps", &self.app_id, "users", user_id])
	}

	/// Sub-resource of a user, e.g. `activate` or `tokens`.
	pub fn user_action(&self, user_id: &str, action: &str) -> Url {
		join(&self.api_base, &["apps", &self.app_id, "users", user_id, action])
	}
}

fn parse_default(field: &'static str, raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|err| {
		ConfigError::Invalid { field, reason: format!("Invalid default URL: {err}.") }.into()
	})
}

// Segments are percent-encoded, so identifiers cannot escape their path position.
fn join(base: &Url, segments: &[&str]) -> Url {
	let mut url = base.clone();

	if let Ok(mut path) = url.path_segments_mut() {
		path.pop_if_empty().extend(segments);
	}

	url
}
