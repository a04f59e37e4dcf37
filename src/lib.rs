//! HMAC-signing relay for the onOffice API: accept automation-platform requests, sign them with
//! HMAC v2, forward them to the onOffice endpoint, and hand the JSON response back.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod relay;
pub mod server;
pub mod sign;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		net::SocketAddr,
		pin::Pin,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
