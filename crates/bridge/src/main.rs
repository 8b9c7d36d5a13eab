//! Lichess UCI bridge binary.
//!
//! Register it in a chess GUI as a UCI engine. Configuration comes from the
//! environment (and a `.env` file); see `BridgeConfig`.

use std::sync::Arc;

use bridge::{Bridge, BridgeConfig};
use lichess::HttpConnector;
use tokio::io::BufReader;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = BridgeConfig::from_env();
    let debug_toggle = bridge::logging::init(&config.log_filter, config.log_file.as_deref())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        token_set = config.token.is_some(),
        "Bridge config loaded"
    );

    let connector = Arc::new(HttpConnector::new(config.client_settings()));
    let bridge = Bridge::new(
        config.initial_settings(),
        config.timeouts.clone(),
        connector,
    )
    .with_debug_toggle(debug_toggle);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(bridge.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()));

    // stdin reads block a runtime thread; do not wait for them forever
    runtime.shutdown_timeout(config.timeouts.grace);
    Ok(())
}
