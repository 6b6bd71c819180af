//! Command and callback handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ParseMode, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::reaction::{Reaction, ReactionEvent};
use crate::session::MessageKey;
use crate::state::BotState;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Show a gallery by its code: /gallery <code>")]
    Gallery(String),
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message) -> ResponseResult<()> {
    let welcome = format!(
        "Welcome to Gallery Reader! 📖\n\n\
        <b>Getting Started:</b>\n\
        1. Use /gallery &lt;code&gt; to look up a gallery\n\
        2. Press {} under the summary to open a reader\n\
        3. Use the reader buttons to turn pages, {} closes it\n\n\
        Type /help for all commands.",
        crate::reaction::OPEN_EMOJI,
        crate::reaction::STOP_EMOJI,
    );

    bot.send_message(msg.chat.id, welcome)
        .parse_mode(ParseMode::Html)
        .await?;

    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    let help_text = Command::descriptions().to_string();
    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Handle the /gallery command: post the summary, then download in the background.
pub async fn handle_gallery(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    code: String,
) -> ResponseResult<()> {
    let code = code.trim();
    let Some(user) = msg.from.as_ref().map(|u| u.id) else {
        debug!(chat_id = %msg.chat.id, "Gallery command without sender, ignoring");
        return Ok(());
    };

    info!(command = "gallery", user = %user, chat_id = %msg.chat.id, code = %code, "Command received");

    if code.is_empty() {
        reply(&bot, &msg, "❌ Please provide a valid code").await?;
        return Ok(());
    }

    match state.post_gallery(msg.chat.id, user, code).await {
        Ok(posted) => {
            state.spawn_acquisition(posted.record);
        }
        Err(e) => {
            warn!(code = %code, chat_id = %msg.chat.id, error = %e, "Gallery command failed");
            reply(&bot, &msg, &e.user_message()).await?;
        }
    }

    Ok(())
}

/// Telegram has no ephemeral messages; errors go to a reply on the command.
async fn reply(bot: &Bot, msg: &Message, text: &str) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Map a button press to a reaction event.
pub fn reaction_event(q: &CallbackQuery) -> Option<ReactionEvent> {
    let message = q.message.as_ref()?;
    let reaction = Reaction::from_emoji(q.data.as_deref().unwrap_or_default());
    let key = MessageKey::new(message.chat().id, message.id());
    Some(ReactionEvent::new(q.from.id, key, reaction).with_receipt(q.id.clone()))
}

/// Handle inline keyboard presses on summaries and readers.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let Some(event) = reaction_event(&q) else {
        debug!(user = %q.from.id, "Callback without message, acknowledging");
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let transition = state.pager().handle(&event).await;

    // Every callback must be answered once or the client keeps spinning.
    if !transition.stripped() {
        bot.answer_callback_query(q.id).await?;
    }
    Ok(())
}

/// Dispatch commands to appropriate handlers.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg).await,
        Command::Help => handle_help(bot, msg).await,
        Command::Gallery(code) => handle_gallery(bot, msg, state, code).await,
    }
}
