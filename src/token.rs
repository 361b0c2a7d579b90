//! Passage token validation against the tenant's published signing keys.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, Validation, decode, decode_header,
	errors::Error as JwtError,
	jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet},
};
use serde::{Deserialize, Serialize};
// self
use crate::{
	_prelude::*,
	ConfigError,
	cache::KeySetCache,
	config::TenantConfig,
	credentials::Credentials,
	http::endpoints::Routes,
	metrics,
};

/// Largest accepted clock skew tolerance.
pub const MAX_LEEWAY: Duration = Duration::from_secs(300);

/// Tolerances applied when checking token claims.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
	/// Clock skew tolerated on `exp`; zero by default.
	#[serde(default)]
	pub leeway: Duration,
}
impl ValidationPolicy {
	/// Policy with the given clock skew tolerance.
	pub fn with_leeway(mut self, leeway: Duration) -> Self {
		self.leeway = leeway;

		self
	}

	/// Validate invariants for the policy.
	pub fn validate(&self) -> Result<()> {
		if self.leeway > MAX_LEEWAY {
			return Err(ConfigError::Invalid {
				field: "validation.leeway",
				reason: format!("Must not exceed {} seconds.", MAX_LEEWAY.as_secs()),
			}
			.into());
		}

		Ok(())
	}
}

/// Why a token was rejected.
#[derive(Debug, thiserror::Error)]
pub enum VerificationFailure {
	/// No token was presented.
	#[error("No token was presented.")]
	MissingToken,
	/// The token header could not be decoded.
	#[error("Token is malformed: {0}")]
	Malformed(#[source] JwtError),
	/// No published key carries the token's `kid`.
	#[error("No signing key matches kid {kid:?}.")]
	NoMatchingKey {
		/// Key identifier from the token header.
		kid: Option<String>,
	},
	/// More than one published key carries the token's `kid`.
	#[error("Multiple signing keys match kid {kid:?}.")]
	AmbiguousKey {
		/// Key identifier from the token header.
		kid: Option<String>,
	},
	/// The matching key cannot be used for signature verification.
	#[error("Signing key is not usable: {reason}")]
	UnsupportedKey {
		/// Why the key was refused.
		reason: &'static str,
	},
	/// The token's `alg` does not belong to the matching key's family.
	#[error("Algorithm {alg:?} does not match the signing key.")]
	AlgorithmMismatch {
		/// Algorithm named by the token header.
		alg: Algorithm,
	},
	/// The key material could not be turned into a verification key.
	#[error("Signing key is invalid: {0}")]
	InvalidKey(#[source] JwtError),
	/// Signature, issuer or expiry verification failed.
	#[error("Token was rejected: {0}")]
	Rejected(#[source] JwtError),
	/// The token carries no usable `sub` claim.
	#[error("Token has no subject.")]
	MissingSubject,
}

#[derive(Debug, Deserialize)]
struct SubjectClaims {
	#[serde(default)]
	sub: Option<String>,
}

/// Validates Passage tokens for one application and extracts their subject.
///
/// Signing keys are downloaded on the first validation and then served from the shared
/// [`KeySetCache`]; clones share the cache.
#[derive(Clone, Debug)]
pub struct TokenValidator {
	keys: KeySetCache,
	app_id: Arc<str>,
	issuer: Arc<str>,
	policy: ValidationPolicy,
}
impl TokenValidator {
	/// Build a validator from a tenant configuration. No API key is required.
	pub fn new(config: &TenantConfig) -> Result<Self> {
		let credentials = Credentials::resolve(config)?;

		config.validate()?;

		let routes = Routes::from_config(config, credentials.app_id())?;
		let keys = KeySetCache::new(&routes, &config.transport, config.key_refresh.clone())?;

		Ok(Self::with_key_set(&routes, keys, config.validation.clone()))
	}

	/// Build a validator over an existing key set cache.
	pub fn with_key_set(routes: &Routes, keys: KeySetCache, policy: ValidationPolicy) -> Self {
		Self {
			keys,
			app_id: Arc::from(routes.app_id()),
			issuer: Arc::from(routes.issuer()),
			policy,
		}
	}

	/// Application the validator accepts tokens for.
	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// Exact issuer tokens must carry.
	pub fn issuer(&self) -> &str {
		&self.issuer
	}

	/// Underlying key set cache.
	pub fn key_set(&self) -> &KeySetCache {
		&self.keys
	}

	/// Validate `token` and return its `sub` claim.
	#[tracing::instrument(skip_all, fields(app_id = %self.app_id))]
	pub async fn validate(&self, token: &str) -> Result<String> {
		let outcome = self.verify(token).await;

		metrics::record_token_validation(&self.app_id, outcome.is_ok());

		match &outcome {
			Ok(_) => tracing::debug!("token accepted"),
			Err(Error::TokenVerificationFailed(cause)) => tracing::warn!(%cause, "token rejected"),
			Err(err) => tracing::warn!(error = %err, "token validation failed"),
		}

		outcome
	}

	async fn verify(&self, token: &str) -> Result<String> {
		if token.trim().is_empty() {
			return Err(rejected(VerificationFailure::MissingToken));
		}

		let jwks = self.keys.key_set().await?;
		let header =
			decode_header(token).map_err(|err| rejected(VerificationFailure::Malformed(err)))?;
		let kid = header.kid.as_deref();
		let jwk = match select_key(&jwks, kid) {
			Err(VerificationFailure::NoMatchingKey { .. }) => self.select_after_refetch(kid).await?,
			selected => selected.map_err(rejected)?,
		};

		ensure_key_family(&jwk, header.alg).map_err(rejected)?;

		let key =
			DecodingKey::from_jwk(&jwk).map_err(|err| rejected(VerificationFailure::InvalidKey(err)))?;
		let mut validation = Validation::new(header.alg);

		validation.set_issuer(&[&*self.issuer]);
		validation.set_required_spec_claims(&["exp", "iss"]);
		validation.validate_aud = false;
		validation.validate_nbf = false;
		validation.leeway = self.policy.leeway.as_secs();

		let data = decode::<SubjectClaims>(token, &key, &validation)
			.map_err(|err| rejected(VerificationFailure::Rejected(err)))?;

		data.claims
			.sub
			.filter(|sub| !sub.is_empty())
			.ok_or_else(|| rejected(VerificationFailure::MissingSubject))
	}

	async fn select_after_refetch(&self, kid: Option<&str>) -> Result<Jwk> {
		if let Some(kid) = kid
			&& let Some(jwks) = self.keys.refetch_for_unknown_kid(kid).await?
		{
			return select_key(&jwks, Some(kid)).map_err(rejected);
		}

		Err(rejected(VerificationFailure::NoMatchingKey { kid: kid.map(ToOwned::to_owned) }))
	}
}

fn rejected(cause: VerificationFailure) -> Error {
	Error::TokenVerificationFailed(cause)
}

/// Pick the single key whose `kid` equals the token's.
fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<Jwk, VerificationFailure> {
	let mut candidates = jwks.keys.iter().filter(|jwk| jwk.common.key_id.as_deref() == kid);

	match (candidates.next(), candidates.next()) {
		(Some(jwk), None) => Ok(jwk.clone()),
		(None, _) => Err(VerificationFailure::NoMatchingKey { kid: kid.map(ToOwned::to_owned) }),
		(Some(_), Some(_)) =>
			Err(VerificationFailure::AmbiguousKey { kid: kid.map(ToOwned::to_owned) }),
	}
}

/// Refuse algorithms outside the key's family, and symmetric keys altogether.
fn ensure_key_family(jwk: &Jwk, alg: Algorithm) -> Result<(), VerificationFailure> {
	let compatible = match &jwk.algorithm {
		AlgorithmParameters::RSA(_) => matches!(
			alg,
			Algorithm::RS256
				| Algorithm::RS384
				| Algorithm::RS512
				| Algorithm::PS256
				| Algorithm::PS384
				| Algorithm::PS512
		),
		AlgorithmParameters::EllipticCurve(params) => matches!(
			(&params.curve, alg),
			(EllipticCurve::P256, Algorithm::ES256) | (EllipticCurve::P384, Algorithm::ES384)
		),
		AlgorithmParameters::OctetKeyPair(_) => alg == Algorithm::EdDSA,
		AlgorithmParameters::OctetKey(_) =>
			return Err(VerificationFailure::UnsupportedKey {
				reason: "Symmetric keys cannot verify Passage tokens.",
			}),
	};

	if compatible { Ok(()) } else { Err(VerificationFailure::AlgorithmMismatch { alg }) }
}
