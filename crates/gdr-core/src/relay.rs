use crate::{
    domain::ChatId,
    locate::DownloadedFile,
    messaging::{port::MessagingPort, types::ChatAction},
    Result,
};

const MIB: f64 = 1024.0 * 1024.0;

/// Per-file outcome of the upload size gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeDecision {
    Send,
    Skip,
}

/// Files strictly larger than `max_bytes` are skipped; equal is still sent.
pub fn size_decision(size: u64, max_bytes: u64) -> SizeDecision {
    if size > max_bytes {
        SizeDecision::Skip
    } else {
        SizeDecision::Send
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub sent: Vec<String>,
    pub skipped: Vec<String>,
}

/// Upload `files` to `chat_id` in order.
///
/// Oversized files are announced and skipped without aborting the loop, even if
/// the notice itself cannot be sent. A document send failure aborts and
/// propagates.
pub async fn relay_files(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    files: &[DownloadedFile],
    max_bytes: u64,
) -> Result<RelaySummary> {
    let mut summary = RelaySummary::default();
    let chat_actions = messenger.capabilities().supports_chat_actions;

    for file in files {
        if size_decision(file.size, max_bytes) == SizeDecision::Skip {
            let notice = format!(
                "⚠️ Skipping '{}': too large ({:.2} MiB, limit {:.0} MiB)",
                file.name,
                file.size as f64 / MIB,
                max_bytes as f64 / MIB
            );
            if let Err(e) = messenger.send_text(chat_id, &notice).await {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send skip notice");
            }
            tracing::warn!(
                chat_id = chat_id.0,
                file = %file.name,
                size = file.size,
                "skipped oversized file"
            );
            summary.skipped.push(file.name.clone());
            continue;
        }

        if chat_actions {
            let _ = messenger
                .send_chat_action(chat_id, ChatAction::UploadDocument)
                .await;
        }
        messenger
            .send_document(chat_id, &file.path, &file.name)
            .await?;
        tracing::info!(chat_id = chat_id.0, file = %file.name, size = file.size, "sent file");
        summary.sent.push(file.name.clone());
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::{MessageId, MessageRef},
        errors::Error,
        messaging::types::MessagingCapabilities,
    };

    /// Accepts documents, rejects every text message.
    #[derive(Default)]
    struct TextRejectingMessenger {
        documents: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingPort for TextRejectingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_chat_actions: false,
            }
        }

        async fn send_text(&self, _chat_id: ChatId, _text: &str) -> Result<MessageRef> {
            Err(Error::Transport("Bad Request: chat not found".to_string()))
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            _path: &Path,
            file_name: &str,
        ) -> Result<MessageRef> {
            self.documents.lock().unwrap().push(file_name.to_string());
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn send_chat_action(&self, _chat_id: ChatId, _action: ChatAction) -> Result<()> {
            Ok(())
        }
    }

    fn file(name: &str, size: u64) -> DownloadedFile {
        DownloadedFile {
            name: name.to_string(),
            path: format!("/nonexistent/{name}").into(),
            size,
        }
    }

    const LIMIT: u64 = 1995 * 1024 * 1024;

    #[test]
    fn exactly_at_limit_is_sent() {
        assert_eq!(size_decision(LIMIT, LIMIT), SizeDecision::Send);
        assert_eq!(size_decision(0, LIMIT), SizeDecision::Send);
    }

    #[test]
    fn over_limit_is_skipped() {
        assert_eq!(size_decision(1996 * 1024 * 1024, LIMIT), SizeDecision::Skip);
        assert_eq!(size_decision(LIMIT + 1, LIMIT), SizeDecision::Skip);
    }

    #[tokio::test]
    async fn failed_skip_notice_does_not_stop_the_relay() {
        let messenger = TextRejectingMessenger::default();
        let files = vec![file("big.bin", 10), file("small.bin", 1)];

        let summary = relay_files(&messenger, ChatId(7), &files, 5).await.unwrap();

        assert_eq!(summary.skipped, vec!["big.bin"]);
        assert_eq!(summary.sent, vec!["small.bin"]);
        assert_eq!(*messenger.documents.lock().unwrap(), vec!["small.bin"]);
    }
}
