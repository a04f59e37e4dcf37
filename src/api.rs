//! HTTP surface: one route, method dispatch, CORS headers, and error → status mapping.
//!
//! Every response, including errors and the 404 fallback, carries
//! `Access-Control-Allow-Origin: *`, `Access-Control-Allow-Methods: POST, OPTIONS`, and
//! `Access-Control-Allow-Headers: Content-Type`, so browser-based automation tools can call the
//! relay directly. `OPTIONS` answers `200` with an empty body whatever the request carries.

// std
use std::iter;
// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{
		HeaderName, HeaderValue, Method, StatusCode,
		header::{
			ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
			ACCESS_CONTROL_ALLOW_ORIGIN,
		},
	},
	response::{IntoResponse, Response},
	routing::any,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	config::{Config, Environment},
	error::RequestError,
	http::UpstreamHttpClient,
	obs::{self, RelayOutcome, RelayStage},
	relay::{ReceivedFields, Relay, RelayRequest},
};

/// `Access-Control-Allow-Origin` value.
pub const ALLOW_ORIGIN: &str = "*";
/// `Access-Control-Allow-Methods` value.
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
/// `Access-Control-Allow-Headers` value.
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Router settings that do not belong to the relay itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiSettings {
	/// Path the relay endpoint is mounted at.
	pub route: String,
	/// Controls whether error bodies include a `stack`.
	pub environment: Environment,
}
impl Default for ApiSettings {
	fn default() -> Self {
		Self { route: "/api/onoffice".into(), environment: Environment::Production }
	}
}
impl From<&Config> for ApiSettings {
	fn from(config: &Config) -> Self {
		Self { route: config.route.clone(), environment: config.environment }
	}
}

struct AppState<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	relay: Relay<C>,
	environment: Environment,
}
impl<C> AppState<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	fn reject(&self, err: Error) -> Response {
		obs::record_relay_outcome(RelayStage::Validate, RelayOutcome::Rejected);
		obs::report_failure(RelayStage::Validate, &err);

		error_response(&err, self.environment)
	}
}
impl<C> Clone for AppState<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	fn clone(&self) -> Self {
		Self { relay: self.relay.clone(), environment: self.environment }
	}
}

/// Builds the relay router with CORS headers and request tracing applied.
pub fn router<C>(relay: Relay<C>, settings: ApiSettings) -> Router
where
	C: ?Sized + UpstreamHttpClient,
{
	let state = AppState { relay, environment: settings.environment };

	Router::new()
		.route(&settings.route, any(relay_endpoint::<C>))
		.fallback(not_found)
		.with_state(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors_header(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN))
		.layer(cors_header(ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS))
		.layer(cors_header(ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS))
}

fn cors_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
	SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

async fn relay_endpoint<C>(
	State(state): State<AppState<C>>,
	method: Method,
	body: Bytes,
) -> Response
where
	C: ?Sized + UpstreamHttpClient,
{
	if method == Method::OPTIONS {
		return StatusCode::OK.into_response();
	}

	obs::record_relay_outcome(RelayStage::Validate, RelayOutcome::Attempt);

	if method != Method::POST {
		return state.reject(RequestError::MethodNotAllowed { method: method.to_string() }.into());
	}

	let request = match RelayRequest::from_json_slice(&body) {
		Ok(request) => request,
		Err(err) => return state.reject(err),
	};

	obs::record_relay_outcome(RelayStage::Validate, RelayOutcome::Success);

	match state.relay.relay(request).await {
		Ok(response) => (StatusCode::OK, Json(response)).into_response(),
		Err(err) => error_response(&err, state.environment),
	}
}

async fn not_found() -> Response {
	(StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found"))).into_response()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	required: Option<[&'static str; 3]>,
	#[serde(skip_serializing_if = "Option::is_none")]
	received: Option<ReceivedFields>,
	#[serde(skip_serializing_if = "Option::is_none")]
	stack: Option<Vec<String>>,
}
impl ErrorBody {
	fn new(error: &'static str) -> Self {
		Self { error, message: None, required: None, received: None, stack: None }
	}

	fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());

		self
	}
}

/// Maps a relay error to its HTTP status and JSON body.
///
/// | Error                                 | Status |
/// |---------------------------------------|--------|
/// | [`RequestError::MethodNotAllowed`]    | 405    |
/// | [`RequestError::MissingFields`]       | 400    |
/// | [`RequestError::MalformedBody`]       | 400    |
/// | anything else                         | 500    |
///
/// `500` bodies carry the error's display text as `message`. Outside
/// [`Environment::Production`] they also carry the source chain as `stack`, except for upstream
/// protocol errors, whose causes may quote the upstream body.
pub fn error_response(err: &Error, environment: Environment) -> Response {
	let (status, body) = match err {
		Error::Request(RequestError::MethodNotAllowed { .. }) =>
			(StatusCode::METHOD_NOT_ALLOWED, ErrorBody::new("Method not allowed. Use POST.")),
		Error::Request(RequestError::MissingFields { received }) => (
			StatusCode::BAD_REQUEST,
			ErrorBody {
				required: Some(ReceivedFields::REQUIRED),
				received: Some(*received),
				..ErrorBody::new("Missing required fields")
			},
		),
		Error::Request(RequestError::MalformedBody { source }) => (
			StatusCode::BAD_REQUEST,
			ErrorBody::new("Invalid request body").with_message(source.to_string()),
		),
		Error::Upstream(_) => (
			StatusCode::INTERNAL_SERVER_ERROR,
			ErrorBody::new("Internal server error").with_message(err.to_string()),
		),
		_ => {
			let mut body = ErrorBody::new("Internal server error").with_message(err.to_string());

			if !environment.is_production() {
				body.stack = Some(
					iter::successors(Some(err as &dyn StdError), |&e| e.source())
						.map(ToString::to_string)
						.collect(),
				);
			}

			(StatusCode::INTERNAL_SERVER_ERROR, body)
		},
	};

	(status, Json(body)).into_response()
}
