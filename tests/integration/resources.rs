//! App, user and session management calls against a mock Passage API.

// std
use std::time::Duration;
// crates.io
use http::StatusCode;
use passage_auth::{
	App, AppInfo, AppOperations, ConfigError, CreateUserRequest, Error, Operation, Passage,
	SessionOperations, TenantConfig, UpdateUserRequest, User, UserOperations, UserStatus,
	VerificationFailure,
};
use reqwest::Client;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::{
	Mock, MockServer, Request, ResponseTemplate,
	matchers::{body_json, header, method, path, query_param},
};
// self
use crate::common;

fn user_body(id: &str, email: &str) -> serde_json::Value {
	json!({ "user": { "id": id, "email": email, "status": "active" } })
}

#[tokio::test]
async fn empty_app_payload_yields_default_app_info() {
	common::init_tracing();

	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/v1/apps/xxx"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
		.expect(1)
		.mount(&server)
		.await;

	let app = App::with_transport(&common::config(&server, "xxx"), Client::new()).expect("app");
	let info = app.get(&CancellationToken::new()).await.expect("app info");

	assert_eq!(info, AppInfo::default());

	server.verify().await;
}

#[tokio::test]
async fn provider_status_is_preserved() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/v1/apps/xxx"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
		.mount(&server)
		.await;

	let passage =
		Passage::with_transport(&common::config(&server, "xxx"), Client::new()).expect("client");
	let err = passage.get_app(&CancellationToken::new()).await.unwrap_err();

	assert!(matches!(
		&err,
		Error::RemoteApi { operation: Operation::GetApp, status, body: Some(body) }
			if *status == StatusCode::NOT_FOUND && body == "{}"
	));
	assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
	assert!(err.to_string().starts_with("Unable to get app."));
}

#[tokio::test]
async fn key_downloads_never_carry_injected_credentials() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(common::jwks_path("xxx")))
		.and(|request: &Request| !request.headers.contains_key("authorization"))
		.respond_with(ResponseTemplate::new(200).set_body_json(common::jwks("k1")))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/v1/apps/xxx"))
		.and(header("authorization", "Bearer injected-key"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
		.expect(1)
		.mount(&server)
		.await;

	let mut headers = http::HeaderMap::new();

	headers.insert(http::header::AUTHORIZATION, "Bearer injected-key".parse().expect("header"));

	let client = Client::builder().default_headers(headers).build().expect("client");
	let passage = Passage::with_transport(&common::config(&server, "xxx"), client).expect("client");
	let cancel = CancellationToken::new();
	let token = common::sign(&common::claims("xxx", "user-1"), "k1");

	assert_eq!(passage.validate_token(&token, &cancel).await.expect("valid"), "user-1");
	assert_eq!(passage.get_app(&cancel).await.expect("app info"), AppInfo::default());

	server.verify().await;
}

#[tokio::test]
async fn unreachable_provider_is_unexpected_with_status_500() {
	let config = TenantConfig::new("xxx")
		.with_require_https(false)
		.with_api_base("http://127.0.0.1:1/v1")
		.expect("api base");
	let user = User::with_transport(&config, Client::new()).expect("user");
	let err = user.get("user-1", &CancellationToken::new()).await.unwrap_err();

	assert!(matches!(err, Error::Unexpected { operation: Operation::GetUser, .. }));
	assert_eq!(err.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
	assert!(err.is_retryable());
}

#[tokio::test]
async fn identifier_lookup_requires_a_unique_match() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/v1/apps/app-1/users"))
		.and(query_param("identifier", "one@example.com"))
		.and(query_param("limit", "2"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(json!({ "users": [{ "id": "user-1" }] })),
		)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/v1/apps/app-1/users"))
		.and(query_param("identifier", "none@example.com"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/v1/apps/app-1/users"))
		.and(query_param("identifier", "twice@example.com"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({ "users": [{ "id": "user-2" }, { "id": "user-3" }] })),
		)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/v1/apps/app-1/users/user-1"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(user_body("user-1", "one@example.com")),
		)
		.expect(1)
		.mount(&server)
		.await;

	let user = User::with_transport(&common::config(&server, "app-1"), Client::new()).expect("user");
	let cancel = CancellationToken::new();
	let found = user.get_by_identifier("one@example.com", &cancel).await.expect("unique match");

	assert_eq!(found.id, "user-1");
	assert_eq!(found.status, UserStatus::Active);

	for identifier in ["none@example.com", "twice@example.com"] {
		let err = user.get_by_identifier(identifier, &cancel).await.unwrap_err();

		assert!(matches!(&err, Error::NotFound { identifier: looked_up } if looked_up == identifier));
		assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
		assert_eq!(
			err.to_string(),
			"The user with the specified identifier could not be found in the system."
		);
	}

	server.verify().await;
}

#[tokio::test]
async fn built_transport_authenticates_every_call() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/v1/apps/app-1/users"))
		.and(header("authorization", "Bearer api-key"))
		.and(header("passage-version", env!("CARGO_PKG_VERSION")))
		.and(body_json(json!({ "email": "new@example.com" })))
		.respond_with(
			ResponseTemplate::new(201).set_body_json(user_body("user-9", "new@example.com")),
		)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("PATCH"))
		.and(path("/v1/apps/app-1/users/user-9"))
		.and(header("authorization", "Bearer api-key"))
		.and(body_json(json!({ "phone": "+15005550006" })))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(user_body("user-9", "new@example.com")),
		)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("PATCH"))
		.and(path("/v1/apps/app-1/users/user-9/deactivate"))
		.and(header("authorization", "Bearer api-key"))
		.respond_with(ResponseTemplate::new(200).set_body_json(
			json!({ "user": { "id": "user-9", "status": "inactive" } }),
		))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("PATCH"))
		.and(path("/v1/apps/app-1/users/user-9/activate"))
		.and(header("authorization", "Bearer api-key"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(user_body("user-9", "new@example.com")),
		)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("DELETE"))
		.and(path("/v1/apps/app-1/users/user-9/tokens"))
		.and(header("authorization", "Bearer api-key"))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("DELETE"))
		.and(path("/v1/apps/app-1/users/user-9"))
		.and(header("authorization", "Bearer api-key"))
		.respond_with(ResponseTemplate::new(204))
		.expect(1)
		.mount(&server)
		.await;

	let passage = Passage::new(&common::config(&server, "app-1").with_api_key("api-key"))
		.expect("client");
	let cancel = CancellationToken::new();
	let created = passage
		.create_user(&CreateUserRequest::with_email("new@example.com"), &cancel)
		.await
		.expect("create");

	assert_eq!(created.id, "user-9");

	let update = UpdateUserRequest { phone: Some("+15005550006".into()), ..Default::default() };

	passage.update_user("user-9", &update, &cancel).await.expect("update");

	let deactivated = passage.user().deactivate("user-9", &cancel).await.expect("deactivate");

	assert!(!deactivated.is_active());
	assert!(passage.user().activate("user-9", &cancel).await.expect("activate").is_active());

	passage.session().revoke_refresh_tokens("user-9", &cancel).await.expect("revoke");
	passage.delete_user("user-9", &cancel).await.expect("delete");

	server.verify().await;
}

#[tokio::test]
async fn cancellation_aborts_in_flight_calls() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/v1/apps/app-1/users/slow"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(user_body("slow", "slow@example.com"))
				.set_delay(Duration::from_secs(10)),
		)
		.mount(&server)
		.await;

	let user = User::with_transport(&common::config(&server, "app-1"), Client::new()).expect("user");
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();

	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(50)).await;
		trigger.cancel();
	});

	let started = std::time::Instant::now();
	let err = user.get("slow", &cancel).await.unwrap_err();

	assert!(matches!(err, Error::Cancelled { operation: Operation::GetUser }));
	assert!(started.elapsed() < Duration::from_secs(5));
	assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn missing_secret_fails_before_any_request() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
		.expect(0)
		.mount(&server)
		.await;

	let passage = Passage::new(&common::config(&server, "app-1")).expect("client");
	let cancel = CancellationToken::new();

	for err in [
		passage.get_app(&cancel).await.unwrap_err(),
		passage.get_user("user-1", &cancel).await.unwrap_err(),
		passage.session().revoke_refresh_tokens("user-1", &cancel).await.unwrap_err(),
	] {
		assert!(matches!(err, Error::Configuration(ConfigError::MissingSecret)));
		assert!(err.to_string().contains("{ApiKey: YOUR_API_KEY}"));
	}

	server.verify().await;
}

#[tokio::test]
async fn missing_app_id_fails_at_construction() {
	for config in [TenantConfig::new(""), TenantConfig::new("  ").with_api_key("api-key")] {
		assert!(matches!(
			Passage::new(&config),
			Err(Error::Configuration(ConfigError::MissingTenantId))
		));
		assert!(matches!(
			Passage::with_transport(&config, Client::new()),
			Err(Error::Configuration(ConfigError::MissingTenantId))
		));
	}
}

#[tokio::test]
async fn header_strategy_reads_bearer_tokens() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(common::jwks_path("app-1")))
		.respond_with(ResponseTemplate::new(200).set_body_json(common::jwks("k1")))
		.mount(&server)
		.await;

	let config = common::config(&server, "app-1")
		.with_auth_strategy(passage_auth::AuthStrategy::Header);
	let passage = Passage::with_transport(&config, Client::new()).expect("client");
	let token = common::sign(&common::claims("app-1", "user-7"), "k1");
	let cancel = CancellationToken::new();
	let mut headers = http::HeaderMap::new();

	headers.insert(
		http::header::AUTHORIZATION,
		format!("Bearer {token}").parse().expect("authorization header"),
	);

	assert_eq!(passage.authenticate_request(&headers, &cancel).await.expect("bearer"), "user-7");

	headers.remove(http::header::AUTHORIZATION);
	headers.insert(
		http::header::COOKIE,
		format!("psg_auth_token={token}").parse().expect("cookie header"),
	);

	assert!(matches!(
		passage.authenticate_request(&headers, &cancel).await,
		Err(Error::TokenVerificationFailed(VerificationFailure::MissingToken))
	));
}
