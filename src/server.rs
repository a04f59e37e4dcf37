//! Listener setup and graceful shutdown.

// crates.io
use axum::Router;
use tokio::net::TcpListener;
// self
use crate::{_prelude::*, error::ConfigError};
#[cfg(feature = "reqwest")]
use crate::{api::{self, ApiSettings}, config::Config, http::ReqwestHttpClient, relay::Relay};

/// Builds the reqwest-backed relay described by `config` and serves it until SIGINT/SIGTERM.
#[cfg(feature = "reqwest")]
pub async fn run(config: Config) -> Result<()> {
	let http_client = ReqwestHttpClient::with_timeout(config.upstream_timeout())?;
	let relay: Relay<ReqwestHttpClient> = Relay::new(http_client, config.upstream_url()?);
	let app = api::router(relay, ApiSettings::from(&config));

	#[cfg(feature = "tracing")]
	tracing::info!(
		route = %config.route,
		upstream = %config.upstream_url,
		timeout_secs = config.upstream_timeout_secs,
		environment = ?config.environment,
		"Relay configured."
	);

	serve(app, config.bind).await
}

/// Binds `addr` and serves `app` until a shutdown signal arrives.
pub async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
	let listener =
		TcpListener::bind(addr).await.map_err(|source| ConfigError::Bind { addr, source })?;

	#[cfg(feature = "tracing")]
	tracing::info!(addr = %listener.local_addr()?, "HTTP server listening.");

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	#[cfg(feature = "tracing")]
	tracing::info!("HTTP server stopped.");

	Ok(())
}

/// Resolves on CTRL+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			report_signal_error("SIGINT", &e);
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(e) => report_signal_error("SIGTERM", &e),
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	#[cfg(feature = "tracing")]
	tracing::info!("Shutdown signal received, draining in-flight requests.");
}

fn report_signal_error(signal: &'static str, err: &std::io::Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(signal, error = %err, "Failed to install signal handler.");
	#[cfg(not(feature = "tracing"))]
	let _ = (signal, err);
}
