use std::sync::Arc;

use gdr_core::config::Config;
use gdr_gdown::{GdownConfig, GdownFetcher};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), gdr_core::Error> {
    gdr_core::logging::init("gdr")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return Err(e);
        }
    };
    let shutdown = CancellationToken::new();

    let fetcher = Arc::new(GdownFetcher::new(
        GdownConfig::from(cfg.as_ref()),
        shutdown.clone(),
    ));

    gdr_telegram::router::run_polling(cfg, fetcher, shutdown)
        .await
        .map_err(|e| gdr_core::Error::Transport(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
