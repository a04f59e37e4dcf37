//! HMAC v2 signing for onOffice API calls.
//!
//! onOffice authenticates a call by recomputing an HMAC-SHA256 over the decimal Unix timestamp
//! followed by the compact JSON encoding of `{"token": .., "request": ..}`. The key order of that
//! object and of everything nested inside `request` is part of the signature, so the canonical
//! input is built from [`CanonicalPayload`] (field order `token`, `request`) and `serde_json`
//! runs with `preserve_order` to keep the caller's key order intact.

// crates.io
use hmac::{Hmac, Mac};
use serde_json::Number;
use sha2::Sha256;
// self
use crate::_prelude::*;

type HmacSha256 = Hmac<Sha256>;

/// Value of the `hmacversion` field understood by onOffice.
pub const HMAC_VERSION: &str = "2";

/// Redacted credential wrapper keeping tokens and secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);
impl Credential {
	/// Wraps a new credential string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the credential is the empty string.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[derive(Serialize)]
struct CanonicalPayload<'a> {
	token: &'a Credential,
	request: &'a Value,
}

/// Builds the exact string onOffice hashes: `timestamp` followed by `{"token":..,"request":..}`.
pub fn canonical_input(timestamp: i64, token: &Credential, request: &Value) -> Result<String> {
	let payload =
		serde_json::to_string(&CanonicalPayload { token, request }).map_err(Error::signing)?;
	let mut input = timestamp.to_string();

	input.push_str(&payload);

	Ok(input)
}

/// Rewrites integral floats (`1.0`, `1e2`) as integers, the way JavaScript prints them.
///
/// Only values representable as `i64` are rewritten; fractional numbers are left untouched.
pub fn normalize_numbers(value: Value) -> Value {
	match value {
		Value::Number(number) => Value::Number(integral_number(number)),
		Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
		Value::Object(map) =>
			Value::Object(map.into_iter().map(|(key, value)| (key, normalize_numbers(value))).collect()),
		other => other,
	}
}

fn integral_number(number: Number) -> Number {
	const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

	match number.as_f64() {
		Some(n) if number.is_f64() && n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&n) =>
			Number::from(n as i64),
		_ => number,
	}
}

/// Computes the lowercase hex HMAC-SHA256 of `input` keyed by `secret`.
pub fn compute_hmac(secret: &Credential, input: &str) -> Result<String> {
	let mut mac =
		HmacSha256::new_from_slice(secret.expose().as_bytes()).map_err(Error::signing)?;

	mac.update(input.as_bytes());

	Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Body POSTed to onOffice. The secret is consumed while signing and never stored here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
	/// Caller's API token, forwarded verbatim.
	pub token: Credential,
	/// Caller's onOffice request payload.
	pub request: Value,
	/// Hex HMAC-SHA256 over [`canonical_input`].
	pub hmac: String,
	/// Always [`HMAC_VERSION`].
	pub hmacversion: String,
	/// Unix seconds the signature was computed for.
	pub timestamp: i64,
}
impl SignedEnvelope {
	/// Signs `request` for `timestamp` with `secret`, normalizing integral floats first so the
	/// forwarded payload is byte-identical to the signed one.
	pub fn sign(
		token: Credential,
		secret: &Credential,
		request: Value,
		timestamp: i64,
	) -> Result<Self> {
		let request = normalize_numbers(request);
		let input = canonical_input(timestamp, &token, &request)?;
		let hmac = compute_hmac(secret, &input)?;

		Ok(Self { token, request, hmac, hmacversion: HMAC_VERSION.into(), timestamp })
	}

	/// Serializes the envelope for the wire.
	pub fn to_json(&self) -> Result<Vec<u8>> {
		serde_json::to_vec(self).map_err(Error::signing)
	}
}
