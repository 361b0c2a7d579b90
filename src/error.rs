//! Crate-wide error taxonomy and `Result` alias.

// crates.io
use http::StatusCode;
use url::Url;
// self
use crate::{http::client::TransportError, normalize::Operation, token::VerificationFailure};

/// Library-wide result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for every Passage operation.
///
/// Transport and cryptography failures never escape in their raw form; they are classified into
/// one of these variants at the façade boundary, with the original cause kept as the error source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Tenant configuration is missing or invalid.
	#[error(transparent)]
	Configuration(#[from] ConfigError),
	/// The tenant's signing keys could not be downloaded.
	///
	/// Nothing is cached on failure, so the next validation attempt fetches again.
	#[error("Unable to download JWKS from {url}: {reason}")]
	KeyFetchFailed {
		/// JWKS endpoint that was queried.
		url: Url,
		/// Human readable failure description.
		reason: String,
		/// Underlying transport failure, when one occurred.
		#[source]
		source: Option<TransportError>,
	},
	/// Token signature, issuer, expiry, or key selection failed.
	#[error("JWT verification has failed because of incorrect signature or payload data.")]
	TokenVerificationFailed(#[source] VerificationFailure),
	/// The provider answered with a non-success status.
	#[error("{} Upstream returned HTTP {status}.", .operation.message())]
	RemoteApi {
		/// Operation that issued the request.
		operation: Operation,
		/// Status code returned by the provider.
		status: StatusCode,
		/// Response body, if any was returned.
		body: Option<String>,
	},
	/// Any failure that carried no provider status (connection reset, undecodable payload, ...).
	#[error("{}", .operation.message())]
	Unexpected {
		/// Operation that was running.
		operation: Operation,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Identifier lookup resolved to zero or more than one user.
	#[error("The user with the specified identifier could not be found in the system.")]
	NotFound {
		/// Email address or phone number that was looked up.
		identifier: String,
	},
	/// The caller cancelled the operation before it completed.
	#[error("Operation '{operation}' was cancelled.")]
	Cancelled {
		/// Operation that was aborted.
		operation: Operation,
	},

	#[cfg(feature = "prometheus")]
	#[allow(missing_docs)]
	#[error("Metrics error: {0}")]
	Metrics(String),
}
impl Error {
	/// HTTP status associated with this error.
	///
	/// Remote failures keep the provider's status; unclassified failures default to `500`.
	pub fn status_code(&self) -> Option<StatusCode> {
		match self {
			Self::RemoteApi { status, .. } => Some(*status),
			Self::Unexpected { .. } => Some(StatusCode::INTERNAL_SERVER_ERROR),
			Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
			_ => None,
		}
	}

	/// Whether repeating the same call may succeed without any change on the caller's side.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::KeyFetchFailed { .. } | Self::Unexpected { .. } => true,
			Self::RemoteApi { status, .. } =>
				status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS,
			_ => false,
		}
	}
}

/// Configuration failures detected before any network access.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// `app_id` was absent or empty.
	#[error(
		"Your configuration is missing an Application ID (AppID). Include it in the following format: {{AppID: YOUR_APP_ID}}."
	)]
	MissingTenantId,
	/// An authenticated operation was attempted without an API key or injected transport.
	#[error(
		"Your configuration is missing an ApiKey. Please include it in the following format: {{ApiKey: YOUR_API_KEY}}."
	)]
	MissingSecret,
	/// A configuration field holds an unusable value.
	#[error("Invalid configuration for {field}: {reason}")]
	Invalid {
		/// Offending field.
		field: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
}
