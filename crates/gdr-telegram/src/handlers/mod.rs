//! Telegram update handlers.
//!
//! Only plain-text messages are relayed; commands get a usage reply and every
//! other update kind is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use gdr_core::domain::UserId;
use gdr_core::security::is_authorized;

use crate::router::AppState;

mod commands;
mod text;

/// Where an incoming message goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    Unauthorized,
    Command,
    Text,
    Ignore,
}

fn route(user_id: Option<UserId>, text: Option<&str>, allowed_users: &[i64]) -> Route {
    if !is_authorized(user_id, allowed_users) {
        return Route::Unauthorized;
    }
    match text {
        Some(t) if t.starts_with('/') => Route::Command,
        Some(_) => Route::Text,
        None => Route::Ignore,
    }
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    match route(user_id, msg.text(), &state.cfg.telegram_allowed_users) {
        Route::Unauthorized => {
            tracing::info!(chat_id = msg.chat.id.0, user_id = ?user_id, "unauthorized message");
            let _ = bot
                .send_message(
                    msg.chat.id,
                    "Unauthorized. Contact the bot owner for access.",
                )
                .await;
            Ok(())
        }
        Route::Command => commands::handle_command(bot, msg, state).await,
        Route::Text => text::handle_text(msg, state).await,
        Route::Ignore => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_rejects_before_anything_else() {
        assert_eq!(
            route(Some(UserId(9)), Some("folders/abc"), &[1]),
            Route::Unauthorized
        );
        assert_eq!(route(None, Some("/start"), &[1]), Route::Unauthorized);
        assert_eq!(route(Some(UserId(9)), None, &[1]), Route::Unauthorized);
    }

    #[test]
    fn commands_and_text_are_split_on_leading_slash() {
        assert_eq!(route(Some(UserId(1)), Some("/help"), &[1]), Route::Command);
        assert_eq!(
            route(Some(UserId(1)), Some("see folders/abc /now"), &[1]),
            Route::Text
        );
        assert_eq!(route(None, Some("folders/abc"), &[]), Route::Text);
    }

    #[test]
    fn non_text_updates_are_ignored() {
        assert_eq!(route(Some(UserId(1)), None, &[1]), Route::Ignore);
        assert_eq!(route(None, None, &[]), Route::Ignore);
    }
}
