//! Shared fixtures: signing keys, mock server wiring and token minting.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use passage_auth::TenantConfig;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Key published by the mock JWKS endpoints.
pub const SIGNING_KEY: &[u8] = include_bytes!("../fixtures/signing_key.pem");
/// Key nobody publishes.
pub const FOREIGN_KEY: &[u8] = include_bytes!("../fixtures/foreign_key.pem");

const SIGNING_KEY_N: &str = "pATI8_lUGG6jSyd75gGu1Kf89KeueoTBS5D9VCowfCd3xSzERQlcz9jFsn-4aMnylEbEYkLWeNsu11_YVf-cpJvKPiTL6jDJv9cCGfLAnDD931sWLdbwrb4PMYmcx8oN9dVtVr2djuidY722y-sEIq1xNGJ0otaYBAH8XPb-nTcn-tR8SfbVV15bmxRMjbF6349_hmn4vOch2M6AEyE4hl3x6HBiV3xSZFORmtGHNM767tsXQlgvZ1WR1PjlgK2MlkNK14pz4eSt8wir-qHAhkLlS0xBLJwFPdr9nosu_abApkduyekXRdjEb4UtULR9HmkUxyqgjdGaC_6PBmF-0Q";

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_env_filter("passage_auth=debug").try_init();
}

/// JWKS document publishing the signing key under `kid`.
pub fn jwks(kid: &str) -> Value {
	json!({
		"keys": [{
			"kty": "RSA",
			"kid": kid,
			"alg": "RS256",
			"use": "sig",
			"n": SIGNING_KEY_N,
			"e": "AQAB",
		}]
	})
}

pub fn jwks_path(app_id: &str) -> String {
	format!("/v1/apps/{app_id}/.well-known/jwks.json")
}

/// Configuration pointing both API and JWKS bases at the mock server.
pub fn config(server: &MockServer, app_id: &str) -> TenantConfig {
	let base = format!("{}/v1", server.uri());

	TenantConfig::new(app_id)
		.with_require_https(false)
		.with_api_base(&base)
		.expect("api base")
		.with_auth_base(&base)
		.expect("auth base")
}

pub fn issuer(app_id: &str) -> String {
	format!("https://auth.passage.id/v1/apps/{app_id}")
}

/// Claims a valid Passage token for `app_id` would carry.
pub fn claims(app_id: &str, sub: &str) -> Value {
	json!({
		"iss": issuer(app_id),
		"sub": sub,
		"exp": chrono::Utc::now().timestamp() + 600,
		"iat": chrono::Utc::now().timestamp(),
	})
}

pub fn sign_with(pem: &[u8], claims: &Value, kid: &str) -> String {
	let key = EncodingKey::from_rsa_pem(pem).expect("signing key");
	let mut header = Header::new(Algorithm::RS256);

	header.kid = Some(kid.to_owned());

	jsonwebtoken::encode(&header, claims, &key).expect("token")
}

pub fn sign(claims: &Value, kid: &str) -> String {
	sign_with(SIGNING_KEY, claims, kid)
}
