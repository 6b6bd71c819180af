//! Outbound chat effects.
//!
//! [`ChatSurface`] is everything the reader does to the chat: post and edit
//! views, attach and strip controls, delete messages. [`TelegramSurface`]
//! implements it with inline keyboards; a pressed button is acknowledged by
//! answering its callback query, which is how a control is "stripped".

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto, MessageId,
    ParseMode,
};
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::reaction::{Reaction, ReactionEvent};
use crate::render::{GallerySummary, PageView};
use crate::session::MessageKey;

/// Errors from chat operations.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The target message was deleted or never existed.
    #[error("message no longer exists")]
    MessageGone,

    #[error("chat API error: {0}")]
    Api(String),
}

#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Post a gallery summary.
    async fn send_summary(
        &self,
        chat: ChatId,
        summary: &GallerySummary,
    ) -> Result<MessageId, SurfaceError>;

    /// Post a new page view.
    async fn send_view(&self, chat: ChatId, view: &PageView) -> Result<MessageId, SurfaceError>;

    /// Replace the view shown by a message, keeping `controls` attached.
    async fn edit_view(
        &self,
        key: MessageKey,
        view: &PageView,
        controls: &[Reaction],
    ) -> Result<(), SurfaceError>;

    async fn delete_message(&self, key: MessageKey) -> Result<(), SurfaceError>;

    /// Attach controls to a message, replacing any it had.
    async fn attach_reactions(
        &self,
        key: MessageKey,
        reactions: &[Reaction],
    ) -> Result<(), SurfaceError>;

    /// Undo a user's press so the control can be used again.
    async fn strip_reaction(&self, event: &ReactionEvent) -> Result<(), SurfaceError>;
}

/// Inline keyboard with one button per control, callback data = emoji.
pub fn controls_keyboard(reactions: &[Reaction]) -> InlineKeyboardMarkup {
    let row: Vec<_> = reactions
        .iter()
        .filter_map(|r| r.emoji())
        .map(|emoji| InlineKeyboardButton::callback(emoji, emoji))
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

fn map_request_error(e: RequestError) -> SurfaceError {
    match e {
        RequestError::Api(ApiError::MessageToEditNotFound)
        | RequestError::Api(ApiError::MessageToDeleteNotFound)
        | RequestError::Api(ApiError::MessageIdInvalid) => SurfaceError::MessageGone,
        other => SurfaceError::Api(other.to_string()),
    }
}

/// Editing a message to identical content is not a failure.
fn ignore_not_modified<T>(result: Result<T, RequestError>) -> Result<(), SurfaceError> {
    match result {
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(map_request_error(e)),
    }
}

fn photo(url: &str) -> Result<InputFile, SurfaceError> {
    let url = url::Url::parse(url).map_err(|e| SurfaceError::Api(format!("invalid image URL {}: {}", url, e)))?;
    Ok(InputFile::url(url))
}

/// [`ChatSurface`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramSurface {
    bot: Bot,
}

impl TelegramSurface {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSurface for TelegramSurface {
    async fn send_summary(
        &self,
        chat: ChatId,
        summary: &GallerySummary,
    ) -> Result<MessageId, SurfaceError> {
        let caption = summary.to_html();

        if let Some(cover_url) = &summary.cover_url {
            let sent = self
                .bot
                .send_photo(chat, photo(cover_url)?)
                .caption(caption.clone())
                .parse_mode(ParseMode::Html)
                .await;
            match sent {
                Ok(message) => return Ok(message.id),
                // Telegram fetches the cover itself and may be refused by the image host.
                Err(e) => {
                    warn!(chat_id = %chat, code = %summary.code, error = %e, "Cover upload failed, sending text summary");
                }
            }
        }

        let message = self
            .bot
            .send_message(chat, caption)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(map_request_error)?;
        Ok(message.id)
    }

    async fn send_view(&self, chat: ChatId, view: &PageView) -> Result<MessageId, SurfaceError> {
        let sent = match view {
            PageView::Page { image_url, caption } => {
                self.bot
                    .send_photo(chat, photo(image_url)?)
                    .caption(caption.clone())
                    .await
            }
            PageView::Error { .. } => self.bot.send_message(chat, view.text()).await,
        };
        sent.map(|message| message.id).map_err(map_request_error)
    }

    async fn edit_view(
        &self,
        key: MessageKey,
        view: &PageView,
        controls: &[Reaction],
    ) -> Result<(), SurfaceError> {
        let keyboard = controls_keyboard(controls);
        let result = match view {
            PageView::Page { image_url, caption } => {
                let media = InputMedia::Photo(InputMediaPhoto::new(photo(image_url)?).caption(caption.clone()));
                self.bot
                    .edit_message_media(key.chat, key.message, media)
                    .reply_markup(keyboard)
                    .await
            }
            PageView::Error { .. } => {
                self.bot
                    .edit_message_caption(key.chat, key.message)
                    .caption(view.text())
                    .reply_markup(keyboard)
                    .await
            }
        };
        ignore_not_modified(result)
    }

    async fn delete_message(&self, key: MessageKey) -> Result<(), SurfaceError> {
        self.bot
            .delete_message(key.chat, key.message)
            .await
            .map(|_| ())
            .map_err(map_request_error)
    }

    async fn attach_reactions(
        &self,
        key: MessageKey,
        reactions: &[Reaction],
    ) -> Result<(), SurfaceError> {
        let result = self
            .bot
            .edit_message_reply_markup(key.chat, key.message)
            .reply_markup(controls_keyboard(reactions))
            .await;
        ignore_not_modified(result)
    }

    async fn strip_reaction(&self, event: &ReactionEvent) -> Result<(), SurfaceError> {
        let Some(receipt) = &event.receipt else {
            debug!(user = %event.user, "Reaction without receipt, nothing to strip");
            return Ok(());
        };
        self.bot
            .answer_callback_query(receipt.clone())
            .await
            .map(|_| ())
            .map_err(map_request_error)
    }
}
