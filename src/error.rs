//! Relay-level error types shared across signing, forwarding, and the HTTP surface.

// self
use crate::{_prelude::*, relay::ReceivedFields};

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller sent a request the relay refuses to sign.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// onOffice answered with something the relay cannot interpret.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Canonical payload could not be produced or authenticated.
	#[error("Failed to sign the request: {reason}.")]
	Signing {
		/// Underlying failure summary.
		reason: String,
	},
	/// Listener failed while serving requests.
	#[error("I/O error occurred while serving requests.")]
	Io(#[from] std::io::Error),
}
impl Error {
	pub(crate) fn signing(reason: impl Display) -> Self {
		Self::Signing { reason: reason.to_string() }
	}
}

/// Configuration and startup failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Layered configuration could not be extracted.
	#[error("Configuration could not be loaded: {0}")]
	Load(#[from] Box<figment::Error>),
	/// Upstream endpoint cannot be parsed.
	#[error("Upstream URL is invalid.")]
	InvalidUpstreamUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Upstream endpoint uses a scheme other than http or https.
	#[error("Upstream URL `{url}` must use http or https.")]
	UnsupportedUpstreamScheme {
		/// Offending URL.
		url: String,
	},
	/// Route does not start with a slash.
	#[error("Route `{route}` must start with `/`.")]
	InvalidRoute {
		/// Offending route.
		route: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Listener could not be bound.
	#[error("Failed to bind the listener to {addr}.")]
	Bind {
		/// Requested socket address.
		addr: SocketAddr,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Log subscriber could not be installed.
	#[error("Log subscriber could not be installed.")]
	Subscriber {
		/// Underlying subscriber failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<figment::Error> for ConfigError {
	fn from(e: figment::Error) -> Self {
		Self::Load(Box::new(e))
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Caller-side failures; none of them reach the upstream API.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// Method other than `POST` or `OPTIONS`.
	#[error("Method not allowed. Use POST.")]
	MethodNotAllowed {
		/// Method the caller used.
		method: String,
	},
	/// At least one of `token`, `secret`, `request` is absent or empty.
	#[error("Missing required fields")]
	MissingFields {
		/// Which of the required fields were present.
		received: ReceivedFields,
	},
	/// Body is not JSON or a field has the wrong type.
	#[error("Request body is invalid: {source}")]
	MalformedBody {
		/// Parsing failure annotated with the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Failures interpreting the upstream response.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Body is not JSON. The parser message stays out of the display text so raw upstream
	/// content never reaches callers.
	#[error("Invalid JSON response from onOffice API")]
	InvalidJson {
		/// HTTP status returned by onOffice.
		status: u16,
		/// Parser failure, kept for logs.
		parse_error: serde_json::Error,
	},
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the onOffice API: {source}")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Upstream did not answer within the configured timeout.
	#[error("Timed out while calling the onOffice API: {source}")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn invalid_json_display_hides_parser_details() {
		let parse_error = serde_json::from_slice::<Value>(b"<html>oops</html>")
			.expect_err("HTML must not parse as JSON.");
		let err = Error::from(UpstreamError::InvalidJson { status: 502, parse_error });

		assert_eq!(err.to_string(), "Invalid JSON response from onOffice API");
		assert!(err.source().is_none());
	}

	#[test]
	fn transport_errors_carry_underlying_message() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
		let err = Error::from(TransportError::network(io));

		assert!(err.to_string().contains("connection refused"));
	}

	#[test]
	fn method_not_allowed_uses_caller_facing_text() {
		let err = RequestError::MethodNotAllowed { method: "GET".into() };

		assert_eq!(err.to_string(), "Method not allowed. Use POST.");
	}
}
