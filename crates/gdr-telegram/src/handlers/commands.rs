use std::sync::Arc;

use teloxide::prelude::*;

use crate::router::AppState;

fn usage(max_upload_bytes: u64) -> String {
    format!(
        "🤖 Send me a Google Drive folder link, e.g.\n\
         https://drive.google.com/drive/folders/<id>\n\n\
         I will download the folder and send every file back to this chat.\n\
         Files over {} MiB are skipped.",
        max_upload_bytes / (1024 * 1024)
    )
}

/// Split `/cmd@BotName args` into the bare command name.
fn command_name(text: &str) -> &str {
    let head = text.split_whitespace().next().unwrap_or("");
    let head = head.strip_prefix('/').unwrap_or(head);
    head.split('@').next().unwrap_or("")
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match command_name(text) {
        "start" | "help" => {
            bot.send_message(msg.chat.id, usage(state.cfg.max_upload_bytes))
                .await?;
        }
        other => tracing::debug!(chat_id = msg.chat.id.0, command = other, "ignored command"),
    }
    Ok(())
}
