//! onOffice relay server: load configuration, install logging, and serve until shutdown.

// self
use onoffice_relay::{config::Config, error::Result, server};

#[tokio::main]
async fn main() -> Result<()> {
	let config = Config::load()?;

	#[cfg(feature = "tracing")]
	onoffice_relay::obs::init_subscriber(&config.log_filter)?;

	server::run(config).await
}
