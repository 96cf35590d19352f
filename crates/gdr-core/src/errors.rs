use std::{path::PathBuf, time::Duration};

/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the handler can
/// turn any failure into a fixed chat reply while the detail goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("no folder id found in message text")]
    InvalidLink,

    #[error("failed to launch {program}: {source}")]
    FetchLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("downloader exited with {status}")]
    FetchFailed { status: String, stderr: String },

    #[error("download timed out after {0:?}")]
    FetchTimedOut(Duration),

    #[error("download cancelled")]
    FetchCancelled,

    #[error("nothing downloaded into {}", dir.display())]
    EmptyResult { dir: PathBuf },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Chat-safe reply for this error. Never includes paths or tool output.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidLink => "❌ Please send a valid Google Drive folder link.".to_string(),
            Error::FetchLaunch { .. } => {
                "❌ Download failed: the downloader could not be started.".to_string()
            }
            Error::FetchFailed { status, .. } => {
                format!("❌ Download failed: downloader exited with {status}.")
            }
            Error::FetchTimedOut(d) => {
                format!("❌ Download failed: timed out after {}s.", d.as_secs())
            }
            Error::FetchCancelled => "❌ Download cancelled: the bot is shutting down.".to_string(),
            Error::EmptyResult { .. } => "❌ Failed to download. Nothing found.".to_string(),
            Error::Transport(_) => "❌ Failed to deliver files to this chat.".to_string(),
            Error::Config(_) | Error::Io(_) => {
                "❌ Something went wrong while processing the folder.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_tool_output_and_paths() {
        let e = Error::FetchFailed {
            status: "exit status: 1".to_string(),
            stderr: "Traceback: /home/op/secret".to_string(),
        };
        let msg = e.user_message();
        assert!(msg.contains("exit status: 1"));
        assert!(!msg.contains("secret"));

        let e = Error::EmptyResult {
            dir: PathBuf::from("/srv/downloads/abc"),
        };
        assert!(!e.user_message().contains("/srv"));

        let e = Error::Io(std::io::Error::other("disk full at /var/lib"));
        assert!(!e.user_message().contains("/var/lib"));
    }
}
