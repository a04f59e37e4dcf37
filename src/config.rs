//! Layered service configuration.
//!
//! Values are merged in priority order (highest last):
//! 1. Built-in defaults ([`Config::default`]).
//! 2. The TOML file [`CONFIG_FILE`] in the working directory, if present.
//! 3. Environment variables prefixed with [`ENV_PREFIX`], e.g. `ONOFFICE_RELAY_BIND`.

// std
use std::time::Duration as StdDuration;
// crates.io
use figment::{
	Figment,
	providers::{Env, Format, Serialized, Toml},
};
// self
use crate::{_prelude::*, error::ConfigError, relay::ONOFFICE_API_URL};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "onoffice-relay.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ONOFFICE_RELAY_";

/// Deployment mode; development responses include error source chains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	/// Error bodies carry only the message.
	#[default]
	Production,
	/// Error bodies also carry a `stack` array.
	Development,
}
impl Environment {
	/// Returns `true` for [`Environment::Production`].
	pub const fn is_production(self) -> bool {
		matches!(self, Self::Production)
	}
}

/// Complete service configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Socket address the HTTP listener binds to.
	pub bind: SocketAddr,
	/// Path the relay endpoint is mounted at.
	pub route: String,
	/// Endpoint signed envelopes are POSTed to.
	pub upstream_url: String,
	/// Upstream request timeout in seconds; `0` waits indefinitely.
	pub upstream_timeout_secs: u64,
	/// Deployment mode.
	pub environment: Environment,
	/// `tracing` filter used when `RUST_LOG` is unset.
	pub log_filter: String,
}
impl Config {
	/// Loads configuration from defaults, [`CONFIG_FILE`], and the environment.
	pub fn load() -> Result<Self, ConfigError> {
		Self::from_figment(Self::figment(CONFIG_FILE))
	}

	/// Builds the provider stack reading `path` as the TOML layer.
	pub fn figment(path: &str) -> Figment {
		Figment::from(Serialized::defaults(Self::default()))
			.merge(Toml::file(path))
			.merge(Env::prefixed(ENV_PREFIX))
	}

	/// Extracts and validates a configuration from an arbitrary provider stack.
	pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
		let config: Self = figment.extract()?;

		config.validate()?;

		Ok(config)
	}

	/// Rejects values the relay cannot run with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.upstream_url()?;

		if !self.route.starts_with('/') {
			return Err(ConfigError::InvalidRoute { route: self.route.clone() });
		}

		Ok(())
	}

	/// Parses [`Config::upstream_url`], accepting only http and https.
	pub fn upstream_url(&self) -> Result<Url, ConfigError> {
		let url = Url::parse(&self.upstream_url)
			.map_err(|source| ConfigError::InvalidUpstreamUrl { source })?;

		if !matches!(url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedUpstreamScheme { url: self.upstream_url.clone() });
		}

		Ok(url)
	}

	/// Upstream timeout, or `None` when disabled.
	pub fn upstream_timeout(&self) -> Option<StdDuration> {
		(self.upstream_timeout_secs > 0).then(|| StdDuration::from_secs(self.upstream_timeout_secs))
	}
}
impl Default for Config {
	fn default() -> Self {
		Self {
			bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
			route: "/api/onoffice".into(),
			upstream_url: ONOFFICE_API_URL.into(),
			upstream_timeout_secs: 30,
			environment: Environment::Production,
			log_filter: "info".into(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn defaults() -> Figment {
		Figment::from(Serialized::defaults(Config::default()))
	}

	#[test]
	fn defaults_target_onoffice() {
		let config = Config::from_figment(defaults()).expect("Defaults should validate.");

		assert_eq!(
			config.upstream_url().expect("Default upstream should parse.").as_str(),
			ONOFFICE_API_URL
		);
		assert_eq!(config.route, "/api/onoffice");
		assert_eq!(config.upstream_timeout(), Some(StdDuration::from_secs(30)));
		assert!(config.environment.is_production());
	}

	#[test]
	fn toml_layer_overrides_defaults() {
		let figment = defaults().merge(Toml::string(
			r#"
				bind = "127.0.0.1:8080"
				upstream_url = "http://127.0.0.1:9000/api.php"
				upstream_timeout_secs = 0
				environment = "development"
			"#,
		));
		let config = Config::from_figment(figment).expect("TOML overrides should validate.");

		assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 8080)));
		assert_eq!(config.upstream_url, "http://127.0.0.1:9000/api.php");
		assert_eq!(config.upstream_timeout(), None);
		assert_eq!(config.environment, Environment::Development);
		assert_eq!(config.log_filter, "info");
	}

	#[test]
	fn validate_rejects_unsupported_scheme() {
		let figment = defaults().merge(Toml::string(r#"upstream_url = "ftp://example.com/api""#));
		let err = Config::from_figment(figment).expect_err("FTP upstream must be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedUpstreamScheme { .. }));
	}

	#[test]
	fn validate_rejects_unparsable_url() {
		let figment = defaults().merge(Toml::string(r#"upstream_url = "not a url""#));
		let err = Config::from_figment(figment).expect_err("Garbage upstream must be rejected.");

		assert!(matches!(err, ConfigError::InvalidUpstreamUrl { .. }));
	}

	#[test]
	fn validate_rejects_relative_route() {
		let figment = defaults().merge(Toml::string(r#"route = "api/onoffice""#));
		let err = Config::from_figment(figment).expect_err("Relative route must be rejected.");

		assert!(matches!(err, ConfigError::InvalidRoute { .. }));
	}

	#[test]
	fn malformed_values_fail_to_load() {
		let figment = defaults().merge(Toml::string(r#"upstream_timeout_secs = "soon""#));
		let err = Config::from_figment(figment).expect_err("String timeout must be rejected.");

		assert!(matches!(err, ConfigError::Load(_)));
	}
}
