use std::sync::Arc;

use teloxide::prelude::*;

use gdr_core::domain::{ChatId, IncomingMessage};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let incoming = IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        text: text.to_string(),
    };

    // Outcomes are reported to the chat and logged inside the relay.
    let _ = state.relay.handle(&incoming).await;
    Ok(())
}
