//! Token validation against mock JWKS endpoints.

// std
use std::time::Duration;
// crates.io
use passage_auth::{
	Error, Passage, RefreshPolicy, SessionOperations, TokenValidator, VerificationFailure,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};
// self
use crate::common;

async fn serve_jwks(server: &MockServer, app_id: &str, body: serde_json::Value, expect: u64) {
	Mock::given(method("GET"))
		.and(path(common::jwks_path(app_id)))
		.respond_with(ResponseTemplate::new(200).set_body_json(body))
		.expect(expect)
		.mount(server)
		.await;
}

#[tokio::test]
async fn repeated_validations_fetch_keys_once() {
	common::init_tracing();

	let server = MockServer::start().await;

	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "app-1")).expect("validator");

	for sub in ["user-1", "user-2", "user-3"] {
		let token = common::sign(&common::claims("app-1", sub), "k1");

		assert_eq!(validator.validate(&token).await.expect("valid token"), sub);
	}

	assert_eq!(validator.key_set().fetch_count(), 1);

	server.verify().await;
}

#[tokio::test]
async fn unknown_kid_fails_after_a_single_fetch() {
	let server = MockServer::start().await;

	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "app-1")).expect("validator");
	let token = common::sign(&common::claims("app-1", "user-1"), "rotated");

	for _ in 0..2 {
		assert!(matches!(
			validator.validate(&token).await,
			Err(Error::TokenVerificationFailed(VerificationFailure::NoMatchingKey { kid: Some(ref kid) }))
				if kid == "rotated"
		));
	}

	server.verify().await;
}

#[tokio::test]
async fn issuer_must_match_exactly() {
	let server = MockServer::start().await;

	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "app-1")).expect("validator");

	for iss in [
		common::issuer("app-2"),
		common::issuer("APP-1"),
		format!("{}/", common::issuer("app-1")),
		format!("{}/v1/apps/app-1", server.uri()),
	] {
		let mut claims = common::claims("app-1", "user-1");

		claims["iss"] = json!(iss);

		let token = common::sign(&claims, "k1");

		assert!(matches!(
			validator.validate(&token).await,
			Err(Error::TokenVerificationFailed(VerificationFailure::Rejected(_)))
		));
	}
}

#[tokio::test]
async fn expired_and_expiry_less_tokens_are_rejected() {
	let server = MockServer::start().await;

	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "app-1")).expect("validator");
	let mut expired = common::claims("app-1", "user-1");

	expired["exp"] = json!(chrono::Utc::now().timestamp() - 60);

	let mut eternal = common::claims("app-1", "user-1");

	eternal.as_object_mut().expect("object").remove("exp");

	for claims in [expired, eternal] {
		let token = common::sign(&claims, "k1");
		let err = validator.validate(&token).await.unwrap_err();

		assert!(matches!(err, Error::TokenVerificationFailed(VerificationFailure::Rejected(_))));
		assert_eq!(
			err.to_string(),
			"JWT verification has failed because of incorrect signature or payload data."
		);
	}
}

#[tokio::test]
async fn signature_from_an_unpublished_key_is_rejected() {
	let server = MockServer::start().await;

	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "app-1")).expect("validator");
	let token = common::sign_with(common::FOREIGN_KEY, &common::claims("app-1", "user-1"), "k1");

	assert!(matches!(
		validator.validate(&token).await,
		Err(Error::TokenVerificationFailed(VerificationFailure::Rejected(_)))
	));
}

#[tokio::test]
async fn key_set_without_keys_is_not_a_fetch_failure() {
	let server = MockServer::start().await;

	serve_jwks(&server, "xxx", json!({}), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "xxx")).expect("validator");
	let token = common::sign(&common::claims("xxx", "user-1"), "k1");

	assert!(matches!(
		validator.validate(&token).await,
		Err(Error::TokenVerificationFailed(VerificationFailure::NoMatchingKey { .. }))
	));
	assert!(validator.key_set().snapshot().await.is_ready());
}

#[tokio::test]
async fn failed_fetch_is_retried_on_next_validation() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(common::jwks_path("app-1")))
		.respond_with(ResponseTemplate::new(200))
		.up_to_n_times(1)
		.mount(&server)
		.await;
	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let validator = TokenValidator::new(&common::config(&server, "app-1")).expect("validator");
	let token = common::sign(&common::claims("app-1", "user-1"), "k1");
	let err = validator.validate(&token).await.unwrap_err();

	assert!(matches!(err, Error::KeyFetchFailed { .. }));
	assert!(err.is_retryable());
	assert_eq!(validator.validate(&token).await.expect("second attempt"), "user-1");
}

#[tokio::test]
async fn rotation_is_picked_up_when_refetch_is_enabled() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(common::jwks_path("app-1")))
		.respond_with(ResponseTemplate::new(200).set_body_json(common::jwks("old")))
		.up_to_n_times(1)
		.mount(&server)
		.await;
	serve_jwks(&server, "app-1", common::jwks("new"), 1).await;

	let config = common::config(&server, "app-1").with_key_refresh(
		RefreshPolicy::default().with_refetch_on_unknown_kid(Duration::ZERO),
	);
	let validator = TokenValidator::new(&config).expect("validator");
	let old = common::sign(&common::claims("app-1", "user-1"), "old");
	let new = common::sign(&common::claims("app-1", "user-2"), "new");

	assert_eq!(validator.validate(&old).await.expect("old key"), "user-1");
	assert_eq!(validator.validate(&new).await.expect("rotated key"), "user-2");
	assert_eq!(validator.key_set().fetch_count(), 2);
}

#[tokio::test]
async fn unknown_kid_during_outage_refetches_once_per_cooldown() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(common::jwks_path("app-1")))
		.respond_with(ResponseTemplate::new(200).set_body_json(common::jwks("k1")))
		.up_to_n_times(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(common::jwks_path("app-1")))
		.respond_with(ResponseTemplate::new(503))
		.mount(&server)
		.await;

	let config = common::config(&server, "app-1").with_key_refresh(
		RefreshPolicy::default().with_refetch_on_unknown_kid(Duration::from_millis(200)),
	);
	let validator = TokenValidator::new(&config).expect("validator");
	let known = common::sign(&common::claims("app-1", "user-1"), "k1");
	let rotated = common::sign(&common::claims("app-1", "user-2"), "rotated");

	assert_eq!(validator.validate(&known).await.expect("known key"), "user-1");

	tokio::time::sleep(Duration::from_millis(250)).await;

	for _ in 0..5 {
		assert!(matches!(
			validator.validate(&rotated).await,
			Err(Error::TokenVerificationFailed(VerificationFailure::NoMatchingKey { .. }))
		));
	}

	assert_eq!(validator.validate(&known).await.expect("cached key"), "user-1");
	assert_eq!(server.received_requests().await.expect("recorded requests").len(), 2);
}

#[tokio::test]
async fn validation_only_client_needs_no_api_key() {
	let server = MockServer::start().await;

	serve_jwks(&server, "app-1", common::jwks("k1"), 1).await;

	let passage = Passage::new(&common::config(&server, "app-1")).expect("client");
	let cancel = CancellationToken::new();
	let token = common::sign(&common::claims("app-1", "user-1"), "k1");

	assert_eq!(passage.validate_token(&token, &cancel).await.expect("valid"), "user-1");
	assert_eq!(passage.session().validate_token(&token, &cancel).await.expect("valid"), "user-1");

	let mut headers = http::HeaderMap::new();

	headers.insert(
		http::header::COOKIE,
		format!("psg_auth_token={token}").parse().expect("cookie header"),
	);

	assert_eq!(passage.authenticate_request(&headers, &cancel).await.expect("cookie"), "user-1");
}
