//! Reader session types.

use gallery_core::GalleryRecord;
use teloxide::types::{ChatId, MessageId, UserId};

/// Identifies a message. Telegram message ids are only unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub chat: ChatId,
    pub message: MessageId,
}

impl MessageKey {
    pub fn new(chat: ChatId, message: MessageId) -> Self {
        Self { chat, message }
    }
}

/// Template created when a gallery summary is posted.
///
/// Never mutated; every reader opened from the summary starts as a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginRecord {
    /// User who ran the command. Not binding for reader ownership.
    pub requester: UserId,
    pub media_id: String,
    pub page_exts: Vec<String>,
    pub total: usize,
    /// Chat the summary was posted in.
    pub chat: ChatId,
    pub code: String,
}

impl OriginRecord {
    pub fn from_record(record: &GalleryRecord, chat: ChatId, requester: UserId) -> Self {
        let page_exts = record.page_extensions();
        Self {
            requester,
            media_id: record.media_id.clone(),
            total: page_exts.len(),
            page_exts,
            chat,
            code: record.code.clone(),
        }
    }

    pub fn has_pages(&self) -> bool {
        self.total > 0 && !self.page_exts.is_empty()
    }

    /// Start a reader at the first page, owned by whoever opened it.
    pub fn open(&self, owner: UserId) -> ReadSession {
        ReadSession {
            owner,
            media_id: self.media_id.clone(),
            page_exts: self.page_exts.clone(),
            current: 0,
            total: self.page_exts.len(),
            chat: self.chat,
            code: self.code.clone(),
        }
    }
}

/// One user's position in an opened gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSession {
    pub owner: UserId,
    pub media_id: String,
    pub page_exts: Vec<String>,
    /// 0-based page index.
    pub current: usize,
    pub total: usize,
    /// Chat hosting the reader message.
    pub chat: ChatId,
    pub code: String,
}

impl ReadSession {
    /// Index of the previous page, if any.
    pub fn previous_page(&self) -> Option<usize> {
        self.current.checked_sub(1)
    }

    /// Index of the next page, if any.
    pub fn next_page(&self) -> Option<usize> {
        let next = self.current + 1;
        (next < self.total).then_some(next)
    }

    /// `current < total` and one extension per page.
    pub fn is_consistent(&self) -> bool {
        self.total == self.page_exts.len() && self.current < self.total
    }
}
