//! Request Signer & Forwarder: validate → sign → forward → parse.
//!
//! [`Relay::relay`] performs exactly one upstream call per invocation and never retries. All
//! per-request state lives on the stack; the relay itself only holds the transport, the
//! upstream URL, and the clock, so one instance serves any number of concurrent callers.

// crates.io
use serde_json::Map;
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	error::{RequestError, UpstreamError},
	http::UpstreamHttpClient,
	obs::{self, RelayOutcome, RelaySpan, RelayStage},
	sign::{Credential, SignedEnvelope},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

/// Fixed onOffice API endpoint signed envelopes are POSTed to.
pub const ONOFFICE_API_URL: &str = "https://api.onoffice.de/api/stable/api.php";

/// Relay specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestRelay = Relay<ReqwestHttpClient>;

/// Which of the required fields were present and non-empty in an inbound body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedFields {
	/// `token` was present.
	pub token: bool,
	/// `secret` was present.
	pub secret: bool,
	/// `request` was present.
	pub request: bool,
}
impl ReceivedFields {
	/// Names of the fields every inbound body must carry.
	pub const REQUIRED: [&'static str; 3] = ["token", "secret", "request"];

	/// Returns `true` when every required field was received.
	pub fn is_complete(&self) -> bool {
		self.token && self.secret && self.request
	}
}

#[derive(Debug, Default, Deserialize)]
struct InboundBody {
	token: Option<Credential>,
	secret: Option<Credential>,
	request: Option<Value>,
	#[serde(rename = "timestampOffset")]
	timestamp_offset: Option<i64>,
}

/// Validated inbound request.
#[derive(Clone, Debug)]
pub struct RelayRequest {
	/// onOffice API token, forwarded verbatim.
	pub token: Credential,
	/// HMAC key; never forwarded.
	pub secret: Credential,
	/// onOffice request payload.
	pub request: Value,
	/// Seconds added to the current Unix time before signing.
	pub timestamp_offset: i64,
}
impl RelayRequest {
	/// Creates a request with no timestamp offset.
	pub fn new(token: impl Into<String>, secret: impl Into<String>, request: Value) -> Self {
		Self {
			token: Credential::new(token),
			secret: Credential::new(secret),
			request,
			timestamp_offset: 0,
		}
	}

	/// Overrides the timestamp offset (seconds, may be negative).
	pub fn with_timestamp_offset(mut self, offset: i64) -> Self {
		self.timestamp_offset = offset;

		self
	}

	/// Parses and validates an inbound JSON body.
	///
	/// The body must be a JSON object; an empty body is treated as `{}`. `null` or absent `timestampOffset` means `0`. A
	/// required field counts as received when it is present and truthy: empty strings, `null`,
	/// `false`, and `0` do not count, while empty objects and arrays do.
	pub fn from_json_slice(body: &[u8]) -> Result<Self> {
		let inbound = if body.iter().all(u8::is_ascii_whitespace) {
			InboundBody::default()
		} else {
			let de = &mut serde_json::Deserializer::from_slice(body);
			let object = serde_path_to_error::deserialize::<_, Map<String, Value>>(de)
				.map_err(|source| RequestError::MalformedBody { source })?;

			serde_path_to_error::deserialize::<_, InboundBody>(Value::Object(object))
				.map_err(|source| RequestError::MalformedBody { source })?
		};
		let received = ReceivedFields {
			token: inbound.token.as_ref().is_some_and(|value| !value.is_empty()),
			secret: inbound.secret.as_ref().is_some_and(|value| !value.is_empty()),
			request: inbound.request.as_ref().is_some_and(is_truthy),
		};

		match inbound {
			InboundBody {
				token: Some(token),
				secret: Some(secret),
				request: Some(request),
				timestamp_offset,
			} if received.is_complete() => Ok(Self {
				token,
				secret,
				request,
				timestamp_offset: timestamp_offset.unwrap_or_default(),
			}),
			_ => Err(RequestError::MissingFields { received }.into()),
		}
	}
}

/// Success body returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
	/// Always `true`.
	pub success: bool,
	/// Timestamp the envelope was signed for.
	pub timestamp: i64,
	/// Offset applied to the clock, echoed back.
	#[serde(rename = "timestampOffset")]
	pub timestamp_offset: i64,
	/// Parsed onOffice response.
	pub data: Value,
}

/// Signs inbound requests and forwards them to the upstream API.
pub struct Relay<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	/// Transport used for the single upstream call.
	pub http_client: Arc<C>,
	/// Upstream endpoint, [`ONOFFICE_API_URL`] in production.
	pub endpoint: Url,
	/// Time source for envelope timestamps.
	pub clock: Arc<dyn Clock>,
}
impl<C> Relay<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	/// Creates a relay targeting `endpoint` with the system clock.
	pub fn new(http_client: impl Into<Arc<C>>, endpoint: Url) -> Self {
		Self { http_client: http_client.into(), endpoint, clock: Arc::new(SystemClock) }
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the timestamp a request would be signed for right now.
	pub fn timestamp_for(&self, request: &RelayRequest) -> Result<i64> {
		self.clock
			.unix_seconds()
			.checked_add(request.timestamp_offset)
			.ok_or_else(|| Error::signing("timestamp offset overflows"))
	}

	/// Computes the signed envelope for `request` without sending it.
	pub fn sign(&self, request: &RelayRequest) -> Result<SignedEnvelope> {
		let timestamp = self.timestamp_for(request)?;

		SignedEnvelope::sign(
			request.token.clone(),
			&request.secret,
			request.request.clone(),
			timestamp,
		)
	}

	/// Signs `request`, POSTs it upstream once, and returns the parsed response.
	pub async fn relay(&self, request: RelayRequest) -> Result<RelayResponse> {
		let timestamp_offset = request.timestamp_offset;
		let envelope = self.staged(RelayStage::Sign, async { self.sign(&request) }).await?;
		let timestamp = envelope.timestamp;
		let data = self.staged(RelayStage::Forward, self.forward(&envelope)).await?;

		Ok(RelayResponse { success: true, timestamp, timestamp_offset, data })
	}

	/// POSTs a signed envelope and parses the reply as JSON.
	pub async fn forward(&self, envelope: &SignedEnvelope) -> Result<Value> {
		let body = envelope.to_json()?;
		let response = self.http_client.post_json(&self.endpoint, body).await?;

		response
			.parse_json()
			.map_err(|parse_error| UpstreamError::InvalidJson { status: response.status, parse_error }.into())
	}

	async fn staged<T, Fut>(&self, stage: RelayStage, fut: Fut) -> Result<T>
	where
		Fut: Future<Output = Result<T>>,
	{
		let span = RelaySpan::new(stage);

		obs::record_relay_outcome(stage, RelayOutcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_relay_outcome(stage, RelayOutcome::Success),
			Err(err) => {
				obs::record_relay_outcome(stage, RelayOutcome::Failure);
				obs::report_failure(stage, err);
			},
		}

		result
	}
}
impl<C> Clone for Relay<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			endpoint: self.endpoint.clone(),
			clock: self.clock.clone(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestHttpClient> {
	/// Creates a reqwest-backed relay targeting [`ONOFFICE_API_URL`].
	pub fn onoffice(http_client: ReqwestHttpClient) -> Result<Self> {
		let endpoint = Url::parse(ONOFFICE_API_URL)
			.map_err(|source| ConfigError::InvalidUpstreamUrl { source })?;

		Ok(Self::new(http_client, endpoint))
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
