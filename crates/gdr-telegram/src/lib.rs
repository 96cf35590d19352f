//! Telegram adapter (teloxide).
//!
//! This crate implements the `gdr-core` MessagingPort over the Telegram Bot API
//! and runs the long-polling dispatcher.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{prelude::*, types::InputFile};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use gdr_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn msg_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    /// Retry once when Telegram asks us to back off (flood control).
    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(retry_after = ?d, "telegram flood control, retrying");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_chat_actions: true,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        // Plain text: file names in notices must not be parsed as markup.
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        file_name: &str,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let doc = InputFile::file(path.to_path_buf()).file_name(file_name.to_string());
                self.bot.send_document(Self::tg_chat(chat_id), doc)
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::UploadDocument => teloxide::types::ChatAction::UploadDocument,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }
}
