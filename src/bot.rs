use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{error, info, warn};

use crate::backend::BackendClient;
use crate::config::Config;
use crate::format::format_for_telegram;

/// Telegram caps messages at 4096 chars; stay under it with some margin.
const MAX_REPLY_CHARS: usize = 4000;
/// Length replies are cut to before the "..." marker is appended.
const TRUNCATED_REPLY_CHARS: usize = 3996;

/// Shown to the user when the backend call fails for any reason.
const BACKEND_APOLOGY: &str = "I couldn't reach the BCN Art Compass backend right now. \
     Please try again in a moment.";

const HELP_MESSAGE: &str = "You can send me any message like:\n\
     - \"I love sculpture and don't like video art\"\n\
     - \"What art exhibitions are happening this weekend?\"\n\
     - \"I'm in Gràcia, suggest something nearby\"\n\n\
     I'll forward it to BCN Art Compass and reply with its recommendations.";

/// Shared application state
pub struct AppState {
    config: Config,
    backend: BackendClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let backend = BackendClient::new(&config.api_base_url)?;
        Ok(Self { config, backend })
    }
}

/// Start the Telegram bot
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.bot_token);

    info!("Starting Telegram bot...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.trim().to_string(),
        None => return Ok(()),
    };

    if text.is_empty() {
        return Ok(());
    }

    if text == "/start" {
        let first_name = msg
            .from
            .as_ref()
            .map(|user| user.first_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("there");
        bot.send_message(msg.chat.id, start_message(first_name))
            .await?;
        return Ok(());
    }

    if text == "/help" {
        bot.send_message(msg.chat.id, HELP_MESSAGE).await?;
        return Ok(());
    }

    // Other commands are left to Telegram's default behavior: no reply.
    if text.starts_with('/') {
        return Ok(());
    }

    let user_id = backend_user_id(&msg);

    // Send "typing" indicator, best-effort
    bot.send_chat_action(msg.chat.id, teloxide::types::ChatAction::Typing)
        .await
        .ok();

    info!(
        "Calling BCN API for user {} with message: {}",
        user_id,
        preview(&text)
    );

    let reply = match state.backend.chat(&user_id, &text).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Error calling BCN Art Compass API: {:#}", e);
            BACKEND_APOLOGY.to_string()
        }
    };

    info!("Received response of length {}", reply.len());

    let formatted = truncate_reply(format_for_telegram(&reply));

    bot.send_message(msg.chat.id, formatted).await?;

    info!("Message sent successfully");

    Ok(())
}

fn start_message(first_name: &str) -> String {
    format!(
        "Hi {first_name}! I'm your BCN Art Compass bot.\n\n\
         Tell me what kind of art or cultural events you're interested in, \
         and I'll ask the BCN Art Compass AI to help you discover exhibitions \
         and galleries in Barcelona."
    )
}

/// Derive the stable backend user id from the inbound message.
///
/// Fallback chain: username, then numeric user id, then chat id, then a
/// sentinel.
fn backend_user_id(msg: &Message) -> String {
    let user = msg.from.as_ref();
    derive_user_id(
        user.and_then(|u| u.username.as_deref()),
        user.map(|u| u.id.0),
        Some(msg.chat.id.0),
    )
}

fn derive_user_id(username: Option<&str>, user_id: Option<u64>, chat_id: Option<i64>) -> String {
    if let Some(name) = username.filter(|n| !n.is_empty()) {
        return format!("tg_{name}");
    }
    if let Some(id) = user_id {
        return format!("tg_id_{id}");
    }
    if let Some(id) = chat_id {
        return format!("tg_chat_{id}");
    }
    "tg_unknown".to_string()
}

/// Cut replies over the Telegram size ceiling down to 3996 chars plus "...".
fn truncate_reply(text: String) -> String {
    if text.chars().count() <= MAX_REPLY_CHARS {
        return text;
    }

    let mut truncated: String = text.chars().take(TRUNCATED_REPLY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// First 50 chars of the message for logging, never splitting a code point.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- derive_user_id ---

    #[test]
    fn user_id_prefers_username() {
        assert_eq!(derive_user_id(Some("alice"), Some(42), Some(7)), "tg_alice");
    }

    #[test]
    fn user_id_falls_back_to_numeric_id() {
        assert_eq!(derive_user_id(None, Some(42), Some(7)), "tg_id_42");
    }

    #[test]
    fn user_id_falls_back_to_chat_id() {
        assert_eq!(derive_user_id(None, None, Some(7)), "tg_chat_7");
    }

    #[test]
    fn user_id_sentinel_when_nothing_available() {
        assert_eq!(derive_user_id(None, None, None), "tg_unknown");
    }

    #[test]
    fn empty_username_is_skipped() {
        assert_eq!(derive_user_id(Some(""), Some(42), Some(7)), "tg_id_42");
    }

    // --- truncate_reply ---

    #[test]
    fn short_reply_is_unchanged() {
        assert_eq!(truncate_reply("hello".to_string()), "hello");
    }

    #[test]
    fn reply_at_limit_is_unchanged() {
        let text = "x".repeat(4000);
        assert_eq!(truncate_reply(text.clone()), text);
    }

    #[test]
    fn long_reply_is_cut_to_3996_plus_ellipsis() {
        let truncated = truncate_reply("x".repeat(4001));
        assert_eq!(truncated.chars().count(), 3999);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..10], "xxxxxxxxxx");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        // 3-byte chars: byte-indexed slicing here would panic or corrupt.
        let truncated = truncate_reply("あ".repeat(4100));
        assert_eq!(truncated.chars().count(), 3999);
        assert!(truncated.ends_with("..."));
    }

    // --- preview ---

    #[test]
    fn preview_keeps_short_text_whole() {
        assert_eq!(preview("hola"), "hola");
    }

    #[test]
    fn preview_cuts_at_fifty_chars() {
        let text = "y".repeat(80);
        assert_eq!(preview(&text).len(), 50);
    }

    #[test]
    fn preview_is_multibyte_safe() {
        let text = "é".repeat(60);
        assert_eq!(preview(&text).chars().count(), 50);
    }

    // --- fixed command replies ---

    #[test]
    fn start_message_uses_first_name() {
        let msg = start_message("Alice");
        assert!(msg.starts_with("Hi Alice!"));
        assert!(msg.contains("BCN Art Compass"));
    }

    #[test]
    fn start_message_fallback_name() {
        assert!(start_message("there").starts_with("Hi there!"));
    }

    #[test]
    fn help_message_lists_examples() {
        assert!(HELP_MESSAGE.contains("Gràcia"));
        assert!(HELP_MESSAGE.contains("forward it to BCN Art Compass"));
    }
}
