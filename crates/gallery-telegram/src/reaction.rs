//! Reader controls and the events they produce.

use teloxide::types::UserId;

use crate::session::MessageKey;

pub const OPEN_EMOJI: &str = "📖";
pub const PREVIOUS_EMOJI: &str = "⬅️";
pub const NEXT_EMOJI: &str = "➡️";
pub const STOP_EMOJI: &str = "⏹️";

/// Emoji variation selector; clients send some emoji with and some without it.
const VARIATION_SELECTOR: char = '\u{fe0f}';

/// A reader control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    Open,
    Previous,
    Next,
    Stop,
    Unknown,
}

impl Reaction {
    /// Controls attached to a reader message, in display order.
    pub const NAVIGATION: [Reaction; 3] = [Reaction::Previous, Reaction::Stop, Reaction::Next];

    pub fn from_emoji(emoji: &str) -> Self {
        let base = emoji.trim().trim_end_matches(VARIATION_SELECTOR);
        [Reaction::Open, Reaction::Previous, Reaction::Next, Reaction::Stop]
            .into_iter()
            .find(|r| {
                r.emoji()
                    .map(|e| e.trim_end_matches(VARIATION_SELECTOR) == base)
                    .unwrap_or(false)
            })
            .unwrap_or(Reaction::Unknown)
    }

    pub fn emoji(self) -> Option<&'static str> {
        match self {
            Reaction::Open => Some(OPEN_EMOJI),
            Reaction::Previous => Some(PREVIOUS_EMOJI),
            Reaction::Next => Some(NEXT_EMOJI),
            Reaction::Stop => Some(STOP_EMOJI),
            Reaction::Unknown => None,
        }
    }
}

/// A user pressed a control on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub user: UserId,
    pub message: MessageKey,
    pub reaction: Reaction,
    /// Platform handle used to acknowledge the press (the callback query id).
    pub receipt: Option<String>,
}

impl ReactionEvent {
    pub fn new(user: UserId, message: MessageKey, reaction: Reaction) -> Self {
        Self {
            user,
            message,
            reaction,
            receipt: None,
        }
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }
}
