//! Transport primitives for forwarding signed envelopes to onOffice.
//!
//! The relay depends on [`UpstreamHttpClient`] only, so tests and embedders can swap the
//! reqwest transport for a fake or an instrumented client. Implementations perform exactly
//! one POST per call and never retry; a failure is surfaced to the caller immediately.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::{header::CONTENT_TYPE, redirect::Policy};
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`UpstreamHttpClient::post_json`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<UpstreamResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of POSTing a JSON body to the upstream API.
///
/// Implementations must be `Send + Sync + 'static` so one instance can be shared by every
/// in-flight request behind an [`Arc`].
pub trait UpstreamHttpClient
where
	Self: 'static + Send + Sync,
{
	/// POSTs `body` to `endpoint` with `Content-Type: application/json` and buffers the reply.
	fn post_json<'a>(&'a self, endpoint: &'a Url, body: Vec<u8>) -> TransportFuture<'a>;
}

/// Buffered upstream reply.
#[derive(Clone, Debug, Default)]
pub struct UpstreamResponse {
	/// HTTP status code returned by the upstream API.
	pub status: u16,
	/// `Content-Type` header, if any.
	pub content_type: Option<String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl UpstreamResponse {
	/// Builds a JSON reply, mainly for fakes.
	pub fn json(status: u16, body: &Value) -> Self {
		Self {
			status,
			content_type: Some("application/json".into()),
			body: body.to_string().into_bytes(),
		}
	}

	/// Parses the body as JSON.
	pub fn parse_json(&self) -> Result<Value, serde_json::Error> {
		serde_json::from_slice(&self.body)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests give up after `timeout`; `None` waits indefinitely.
	///
	/// Redirects are never followed, so each call reaches exactly one upstream URL.
	pub fn with_timeout(timeout: Option<std::time::Duration>) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().redirect(Policy::none());

		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl UpstreamHttpClient for ReqwestHttpClient {
	fn post_json<'a>(&'a self, endpoint: &'a Url, body: Vec<u8>) -> TransportFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.post(endpoint.clone())
				.header(CONTENT_TYPE, "application/json")
				.body(body)
				.send()
				.await?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(ToOwned::to_owned);
			let body = response.bytes().await?.to_vec();

			Ok(UpstreamResponse { status, content_type, body })
		})
	}
}
