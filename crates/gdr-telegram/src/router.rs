use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use gdr_core::{
    config::Config,
    fetch::FolderFetcher,
    handler::{FolderRelay, RelaySettings},
    messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub relay: Arc<FolderRelay>,
}

/// Telegram client with a request timeout long enough for large uploads and,
/// optionally, a self-hosted Bot API server (required above 50 MB).
fn build_bot(cfg: &Config) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(cfg.upload_timeout)
        .build()
        .context("failed to build telegram http client")?;
    let bot = Bot::with_client(cfg.telegram_bot_token.clone(), client);

    let Some(raw) = cfg.telegram_api_url.as_deref() else {
        return Ok(bot);
    };
    let url = reqwest::Url::parse(raw)
        .with_context(|| format!("invalid TELEGRAM_API_URL {raw:?}"))?;
    Ok(bot.set_api_url(url))
}

/// Run the bot until Ctrl-C. Cancelling `shutdown` stops in-flight downloads.
pub async fn run_polling(
    cfg: Arc<Config>,
    fetcher: Arc<dyn FolderFetcher>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let bot = build_bot(&cfg)?;

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; continuing"),
    }
    tracing::info!(
        download_root = %cfg.download_root.display(),
        gdown = %cfg.gdown_path.display(),
        max_upload_bytes = cfg.max_upload_bytes,
        allowed_users = cfg.telegram_allowed_users.len(),
        "relay configured"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let relay = Arc::new(FolderRelay::new(
        RelaySettings::from(cfg.as_ref()),
        fetcher,
        messenger,
    ));
    let state = Arc::new(AppState { cfg, relay });

    // The dispatcher's own Ctrl-C handler drains handlers; this one makes sure a
    // long download does not hold that drain up.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested; cancelling in-flight downloads");
                shutdown.cancel();
            }
        });
    }

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    shutdown.cancel();
    tracing::info!("bot stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(api_url: Option<&str>) -> Config {
        let mut cfg = Config::from_lookup(|k| match k {
            "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
            _ => None,
        })
        .unwrap();
        cfg.telegram_api_url = api_url.map(str::to_string);
        cfg
    }

    #[test]
    fn builds_bot_with_custom_api_url() {
        let bot = build_bot(&cfg(Some("http://localhost:8081"))).unwrap();
        assert_eq!(bot.api_url().as_str(), "http://localhost:8081/");
    }

    #[test]
    fn rejects_malformed_api_url() {
        assert!(build_bot(&cfg(Some("not a url"))).is_err());
    }
}
