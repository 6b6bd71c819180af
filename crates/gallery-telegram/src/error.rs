//! Error types for the Telegram bot.

use gallery_core::FetchError;
use thiserror::Error;

use crate::surface::SurfaceError;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided or invalid.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Gallery metadata could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A chat message could not be sent or edited.
    #[error("Chat error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl TelegramError {
    /// Reply shown to the user who ran the command.
    pub fn user_message(&self) -> String {
        match self {
            TelegramError::Fetch(FetchError::InvalidCode(_)) => {
                "❌ Please provide a valid code".to_string()
            }
            TelegramError::Surface(_) => "❌ Failed to send message".to_string(),
            other => format!("❌ Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let invalid = TelegramError::from(FetchError::InvalidCode("../x".to_string()));
        assert_eq!(invalid.user_message(), "❌ Please provide a valid code");

        let missing = TelegramError::from(FetchError::NotFound {
            code: "999999".to_string(),
        });
        assert!(missing.user_message().starts_with("❌ Error: "));
        assert!(missing.user_message().contains("999999"));

        let gone = TelegramError::from(SurfaceError::MessageGone);
        assert_eq!(gone.user_message(), "❌ Failed to send message");
    }

    #[test]
    fn test_bootstrap_errors_reply_with_reason() {
        for err in [
            TelegramError::NoToken,
            TelegramError::BotStartFailed("unauthorized".to_string()),
        ] {
            // Exhaustive so a new variant must decide its reply here.
            let expected = match &err {
                TelegramError::NoToken => "TELEGRAM_BOT_TOKEN",
                TelegramError::BotStartFailed(_) => "unauthorized",
                TelegramError::Fetch(_) | TelegramError::Surface(_) => unreachable!(),
            };
            let message = err.user_message();
            assert!(message.starts_with("❌ Error: "), "{message}");
            assert!(message.contains(expected), "{message}");
        }
    }
}
