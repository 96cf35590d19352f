use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities},
    Result,
};

/// Outbound messaging port.
///
/// Replies always go back to the chat the folder link came from.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Upload a local file as a document attachment under `file_name`.
    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        file_name: &str,
    ) -> Result<MessageRef>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
