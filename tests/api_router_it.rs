// std
use std::sync::Arc;
// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Method, Request, StatusCode},
};
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;
// self
use onoffice_relay::{
	api::{self, ApiSettings},
	clock::FixedClock,
	config::Environment,
	http::ReqwestHttpClient,
	relay::Relay,
	url::Url,
};

const ROUTE: &str = "/api/onoffice";

fn relay_for(server: &MockServer) -> Relay<ReqwestHttpClient> {
	let http_client =
		ReqwestHttpClient::with_timeout(None).expect("Reqwest client should build for tests.");
	let endpoint = Url::parse(&server.url("/api.php")).expect("Mock endpoint should parse.");

	Relay::new(http_client, endpoint)
}

fn settings(environment: Environment) -> ApiSettings {
	ApiSettings { route: ROUTE.into(), environment }
}

async fn call(app: Router, method: Method, body: Value) -> (StatusCode, Value) {
	let request = Request::builder()
		.method(method)
		.uri(ROUTE)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("Request fixture should build.");
	let response = app.oneshot(request).await.expect("Router is infallible.");
	let status = response.status();

	assert_eq!(response.headers()["access-control-allow-origin"], "*");
	assert_eq!(response.headers()["access-control-allow-methods"], "POST, OPTIONS");
	assert_eq!(response.headers()["access-control-allow-headers"], "Content-Type");

	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should buffer.");
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Response body should be JSON.")
	};

	(status, json)
}

#[tokio::test]
async fn post_relays_reference_scenario() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api.php").json_body(json!({
				"token": "T",
				"request": { "method": "GET" },
				"hmac": "9492922268ee09fccecb8c420be83127507572edcc605967d8688e1e3f3c62d0",
				"hmacversion": "2",
				"timestamp": 1_700_000_000
			}));
			then.status(200).json_body(json!({ "status": { "code": 200 }, "response": {} }));
		})
		.await;
	let relay = relay_for(&server).with_clock(Arc::new(FixedClock::new(1_700_000_000)));
	let app = api::router(relay, settings(Environment::Production));
	let (status, body) = call(
		app,
		Method::POST,
		json!({ "token": "T", "secret": "S", "request": { "method": "GET" } }),
	)
	.await;

	mock.assert_async().await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		body,
		json!({
			"success": true,
			"timestamp": 1_700_000_000,
			"timestampOffset": 0,
			"data": { "status": { "code": 200 }, "response": {} }
		})
	);
}

#[tokio::test]
async fn post_with_offset_uses_wall_clock() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api.php");
			then.status(200).json_body(json!({ "status": { "code": 200 } }));
		})
		.await;
	let app = api::router(relay_for(&server), settings(Environment::Production));
	let before = OffsetDateTime::now_utc().unix_timestamp();
	let (status, body) = call(
		app,
		Method::POST,
		json!({ "token": "T", "secret": "S", "request": {}, "timestampOffset": -7200 }),
	)
	.await;
	let after = OffsetDateTime::now_utc().unix_timestamp();

	mock.assert_async().await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["timestampOffset"], -7200);

	let timestamp = body["timestamp"].as_i64().expect("Timestamp should be an integer.");

	assert!((before - 7200 - 1..=after - 7200 + 1).contains(&timestamp));
}

#[tokio::test]
async fn missing_fields_never_reach_upstream() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api.php");
			then.status(200).json_body(json!({}));
		})
		.await;
	let app = api::router(relay_for(&server), settings(Environment::Production));
	let (status, body) =
		call(app, Method::POST, json!({ "token": "T", "request": { "method": "GET" } })).await;

	mock.assert_calls_async(0).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(
		body,
		json!({
			"error": "Missing required fields",
			"required": ["token", "secret", "request"],
			"received": { "token": true, "secret": false, "request": true }
		})
	);
}

#[tokio::test]
async fn options_and_wrong_methods_skip_upstream() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.path("/api.php");
			then.status(200).json_body(json!({}));
		})
		.await;
	let app = api::router(relay_for(&server), settings(Environment::Production));
	let (status, body) = call(app.clone(), Method::OPTIONS, json!({ "token": "T" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, Value::Null);

	let (status, body) = call(app, Method::GET, json!({})).await;

	assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
	assert_eq!(body, json!({ "error": "Method not allowed. Use POST." }));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn non_json_upstream_maps_to_fixed_500() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api.php");
			then.status(200).body("Fatal error: maintenance");
		})
		.await;
	let app = api::router(relay_for(&server), settings(Environment::Development));
	let (status, body) =
		call(app, Method::POST, json!({ "token": "T", "secret": "S", "request": {} })).await;

	mock.assert_async().await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		body,
		json!({ "error": "Internal server error", "message": "Invalid JSON response from onOffice API" })
	);
}

#[tokio::test]
async fn network_failures_map_to_500_with_message() {
	let http_client =
		ReqwestHttpClient::with_timeout(None).expect("Reqwest client should build for tests.");
	let endpoint = Url::parse("http://127.0.0.1:1/api.php").expect("Closed endpoint should parse.");
	let relay: Relay<ReqwestHttpClient> = Relay::new(http_client, endpoint);
	let app = api::router(relay, settings(Environment::Development));
	let (status, body) =
		call(app, Method::POST, json!({ "token": "T", "secret": "S", "request": {} })).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "Internal server error");
	assert!(
		body["message"]
			.as_str()
			.is_some_and(|m| m.starts_with("Network error occurred while calling the onOffice API"))
	);
	assert!(body["stack"].as_array().is_some_and(|stack| stack.len() >= 2));
}
