//! Per-message orchestration: extract → fetch → locate → relay → clean up.
//!
//! Every failure is handled here and turned into one chat reply; nothing
//! propagates back into the transport.

use std::{fmt, path::PathBuf, sync::Arc};

use crate::{
    config::Config,
    domain::{ChatId, IncomingMessage},
    errors::Error,
    fetch::FolderFetcher,
    link::{extract_folder_id, FolderId},
    locate::locate_source,
    messaging::port::MessagingPort,
    relay::{relay_files, RelaySummary},
    workdir::WorkDir,
};

pub const DOWNLOADING_TEXT: &str = "📥 Downloading files from Google Drive...";
pub const ALL_SENT_TEXT: &str = "✅ All files sent!";

/// Pipeline stage a request was in when it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    AwaitingFolderId,
    /// Creating the per-request work dir, before anything is fetched.
    Preparing,
    Fetching,
    Locating,
    Relaying,
    Cleaning,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::AwaitingFolderId => "awaiting_folder_id",
            Stage::Preparing => "preparing",
            Stage::Fetching => "fetching",
            Stage::Locating => "locating",
            Stage::Relaying => "relaying",
            Stage::Cleaning => "cleaning",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// No folder link in the text; nothing was fetched or written.
    InvalidLink,
    Completed {
        folder: FolderId,
        summary: RelaySummary,
    },
    Failed {
        stage: Stage,
        error: Error,
    },
}

#[derive(Clone, Debug)]
pub struct RelaySettings {
    pub download_root: PathBuf,
    pub max_upload_bytes: u64,
    pub keep_failed_downloads: bool,
}

impl From<&Config> for RelaySettings {
    fn from(cfg: &Config) -> Self {
        Self {
            download_root: cfg.download_root.clone(),
            max_upload_bytes: cfg.max_upload_bytes,
            keep_failed_downloads: cfg.keep_failed_downloads,
        }
    }
}

/// Handles one incoming chat message end to end.
///
/// Safe to call concurrently: each call stages its download in its own
/// [`WorkDir`].
pub struct FolderRelay {
    settings: RelaySettings,
    fetcher: Arc<dyn FolderFetcher>,
    messenger: Arc<dyn MessagingPort>,
}

impl FolderRelay {
    pub fn new(
        settings: RelaySettings,
        fetcher: Arc<dyn FolderFetcher>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            messenger,
        }
    }

    pub async fn handle(&self, msg: &IncomingMessage) -> Outcome {
        let chat_id = msg.chat_id;

        let Some(folder) = extract_folder_id(&msg.text) else {
            tracing::info!(
                chat_id = chat_id.0,
                stage = %Stage::AwaitingFolderId,
                "message has no folder link"
            );
            self.reply(chat_id, &Error::InvalidLink.user_message()).await;
            return Outcome::InvalidLink;
        };

        tracing::info!(
            chat_id = chat_id.0,
            folder = %folder,
            url = %folder.url(),
            "received folder link"
        );
        self.reply(chat_id, DOWNLOADING_TEXT).await;

        let work = match WorkDir::create(&self.settings.download_root, &folder).await {
            Ok(w) => w,
            Err(e) => return self.fail(chat_id, Stage::Preparing, e, None).await,
        };

        match self.process(chat_id, &folder, &work).await {
            Ok(summary) => {
                self.reply(chat_id, ALL_SENT_TEXT).await;
                self.clean_up(work).await;
                Outcome::Completed { folder, summary }
            }
            Err((stage, error)) => self.fail(chat_id, stage, error, Some(work)).await,
        }
    }

    async fn process(
        &self,
        chat_id: ChatId,
        folder: &FolderId,
        work: &WorkDir,
    ) -> std::result::Result<RelaySummary, (Stage, Error)> {
        tracing::info!(folder = %folder, dest = %work.path().display(), "fetch started");
        self.fetcher
            .fetch(folder, work.path())
            .await
            .map_err(|e| (Stage::Fetching, e))?;
        tracing::info!(folder = %folder, "fetch finished");

        let source = locate_source(work.path())
            .await
            .map_err(|e| (Stage::Locating, e))?;
        tracing::info!(
            folder = %folder,
            layout = ?source.layout,
            dir = %source.dir.display(),
            files = source.files.len(),
            "located download"
        );

        relay_files(
            self.messenger.as_ref(),
            chat_id,
            &source.files,
            self.settings.max_upload_bytes,
        )
        .await
        .map_err(|e| (Stage::Relaying, e))
    }

    async fn clean_up(&self, work: WorkDir) {
        let path = work.path().to_path_buf();
        match work.remove().await {
            Ok(()) => tracing::info!(path = %path.display(), "deleted work dir"),
            Err(e) => tracing::warn!(
                stage = %Stage::Cleaning,
                path = %path.display(),
                error = %e,
                "failed to delete work dir"
            ),
        }
    }

    async fn fail(
        &self,
        chat_id: ChatId,
        stage: Stage,
        error: Error,
        work: Option<WorkDir>,
    ) -> Outcome {
        match &error {
            Error::EmptyResult { dir } => tracing::warn!(
                chat_id = chat_id.0,
                stage = %stage,
                dir = %dir.display(),
                "nothing downloaded"
            ),
            Error::FetchFailed { status, stderr } => tracing::error!(
                chat_id = chat_id.0,
                stage = %stage,
                status = %status,
                stderr = %stderr,
                "download failed"
            ),
            other => tracing::error!(
                chat_id = chat_id.0,
                stage = %stage,
                error = %other,
                "request failed"
            ),
        }

        self.reply(chat_id, &error.user_message()).await;

        if let Some(work) = work {
            if self.settings.keep_failed_downloads {
                let path = work.keep();
                tracing::info!(path = %path.display(), "kept work dir of failed request");
            } else {
                self.clean_up(work).await;
            }
        }

        Outcome::Failed { stage, error }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
        }
    }
}
