//! Main Telegram bot implementation.

use std::sync::Arc;

use gallery_core::ReaderConfig;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, UserId};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::error::{Result, TelegramError};
use crate::handlers::{handle_callback, handle_command, Command};
use crate::state::create_shared_state;
use crate::surface::TelegramSurface;

/// The gallery reader bot.
pub struct ReaderBot {
    /// The teloxide bot instance.
    bot: Bot,
    config: ReaderConfig,
}

impl ReaderBot {
    /// Create a new ReaderBot instance.
    ///
    /// Requires `TELEGRAM_BOT_TOKEN` environment variable to be set.
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(TelegramError::NoToken)?;

        Ok(Self {
            bot: Bot::new(token),
            config,
        })
    }

    /// Get the bot's username and user id.
    pub async fn get_me(&self) -> Result<(String, UserId)> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok((me.username().to_string(), me.user.id))
    }

    /// Register the command list shown by Telegram clients.
    pub async fn register_commands(&self) -> Result<()> {
        self.bot
            .set_my_commands(Command::bot_commands())
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        info!("Registered bot commands");
        Ok(())
    }

    /// Remove the registered command list.
    pub async fn remove_commands(&self) -> Result<()> {
        self.bot
            .delete_my_commands()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        info!("Removed bot commands");
        Ok(())
    }

    /// Start the bot in polling mode. Returns after Ctrl+C.
    pub async fn start_polling(&self, bot_user: UserId) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        let bot = self.bot.clone();
        let surface = Arc::new(TelegramSurface::new(bot.clone()));
        let state = create_shared_state(&self.config, surface, Some(bot_user))?;

        if let Err(e) = tokio::fs::create_dir_all(state.download_dir()).await {
            warn!(path = %state.download_dir().display(), error = %e, "Failed to create download directory");
        }

        let state_for_commands = Arc::clone(&state);
        let state_for_callbacks = Arc::clone(&state);

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query()
                    .endpoint(move |bot: Bot, q: CallbackQuery| {
                        let state = Arc::clone(&state_for_callbacks);
                        async move { handle_callback(bot, q, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text()
                            .map(|t| t.starts_with('/'))
                            .unwrap_or(false)
                    })
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            info!(cmd = %text, "Unrecognized command - sending response");
                            bot.send_message(
                                msg.chat.id,
                                format!(
                                    "Unknown command: {}\n\nUse /help to see available commands.",
                                    text.split_whitespace().next().unwrap_or(text)
                                ),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            );

        info!("Bot is running! Send /gallery <code> to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Bot stopped");
        Ok(())
    }
}
