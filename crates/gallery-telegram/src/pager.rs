//! Reactive pagination engine.
//!
//! Turns reaction events on summary and reader messages into session changes
//! and chat effects. All state lives in the [`SessionStore`]; the pager holds
//! no lock across a chat call.

use std::sync::Arc;

use gallery_core::Endpoints;
use teloxide::types::UserId;
use tracing::{debug, info, warn};

use crate::reaction::{Reaction, ReactionEvent};
use crate::render::render_page;
use crate::session::{MessageKey, ReadSession};
use crate::store::{SessionStore, SwapOutcome};
use crate::surface::{ChatSurface, SurfaceError};

/// Stale compare-and-swap retries before a navigation gives up.
const MAX_SWAP_ATTEMPTS: usize = 8;

/// Why a navigation or stop was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No reader is registered for the message.
    NoSession,
    /// The reacting user does not own the reader.
    NotOwner,
    /// The page kept changing underneath the request.
    Contended,
}

/// What handling one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing happened (unknown reaction, own event, no origin).
    Ignored,
    /// A new reader message was posted.
    Opened { reader: MessageKey },
    /// The reader now shows `page` (0-based).
    Moved { page: usize },
    /// Already at the first or last page.
    AtBoundary { page: usize },
    /// The reader was closed and its message deleted.
    Stopped,
    /// The reader disappeared while handling the event.
    Gone,
    Rejected(Rejection),
}

impl Transition {
    /// Whether the triggering reaction was already stripped.
    pub fn stripped(&self) -> bool {
        matches!(
            self,
            Transition::Opened { .. }
                | Transition::Moved { .. }
                | Transition::AtBoundary { .. }
                | Transition::Rejected(_)
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn target(self, session: &ReadSession) -> Option<usize> {
        match self {
            Direction::Previous => session.previous_page(),
            Direction::Next => session.next_page(),
        }
    }
}

/// Pagination engine over a session store and a chat surface.
#[derive(Clone)]
pub struct Pager {
    store: Arc<dyn SessionStore>,
    surface: Arc<dyn ChatSurface>,
    endpoints: Endpoints,
    bot_user: Option<UserId>,
}

impl Pager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        surface: Arc<dyn ChatSurface>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            store,
            surface,
            endpoints,
            bot_user: None,
        }
    }

    /// Drop events produced by the bot itself.
    pub fn with_bot_user(mut self, user: UserId) -> Self {
        self.bot_user = Some(user);
        self
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn surface(&self) -> &Arc<dyn ChatSurface> {
        &self.surface
    }

    /// Handle one reaction event.
    pub async fn handle(&self, event: &ReactionEvent) -> Transition {
        if self.bot_user == Some(event.user) {
            return Transition::Ignored;
        }

        let transition = match event.reaction {
            Reaction::Open => self.open(event).await,
            Reaction::Previous => self.navigate(event, Direction::Previous).await,
            Reaction::Next => self.navigate(event, Direction::Next).await,
            Reaction::Stop => self.stop(event).await,
            Reaction::Unknown => Transition::Ignored,
        };

        debug!(
            user = %event.user,
            chat_id = %event.message.chat,
            message_id = event.message.message.0,
            reaction = ?event.reaction,
            transition = ?transition,
            "Handled reaction"
        );
        transition
    }

    async fn open(&self, event: &ReactionEvent) -> Transition {
        let Some(origin) = self.store.origin(event.message).await else {
            return Transition::Ignored;
        };
        if !origin.has_pages() {
            debug!(code = %origin.code, "Gallery has no pages, not opening a reader");
            return Transition::Ignored;
        }

        let session = origin.open(event.user);
        let view = render_page(&self.endpoints, &session, 0);

        let message = match self.surface.send_view(origin.chat, &view).await {
            Ok(message) => message,
            Err(e) => {
                warn!(code = %origin.code, chat_id = %origin.chat, error = %e, "Failed to post reader");
                return Transition::Ignored;
            }
        };

        let reader = MessageKey::new(origin.chat, message);
        // Must be registered before controls are attached.
        self.store.put_reader(reader, session).await;

        if let Err(e) = self
            .surface
            .attach_reactions(reader, &Reaction::NAVIGATION)
            .await
        {
            warn!(code = %origin.code, error = %e, "Failed to attach reader controls");
        }
        self.strip(event).await;

        info!(
            code = %origin.code,
            user = %event.user,
            chat_id = %origin.chat,
            reader = reader.message.0,
            "Opened reader"
        );
        Transition::Opened { reader }
    }

    async fn navigate(&self, event: &ReactionEvent, direction: Direction) -> Transition {
        let key = event.message;

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let Some(session) = self.store.reader(key).await else {
                return self.reject(event, Rejection::NoSession).await;
            };
            if session.owner != event.user {
                return self.reject(event, Rejection::NotOwner).await;
            }

            let Some(target) = direction.target(&session) else {
                self.strip(event).await;
                return Transition::AtBoundary {
                    page: session.current,
                };
            };

            match self.store.swap_page(key, session.current, target).await {
                SwapOutcome::Swapped(updated) => return self.show(event, &updated).await,
                SwapOutcome::Stale(_) => continue,
                SwapOutcome::Missing => return self.reject(event, Rejection::NoSession).await,
            }
        }

        warn!(message_id = key.message.0, "Gave up navigating a contended reader");
        self.reject(event, Rejection::Contended).await
    }

    /// Edit the reader to show its current page.
    async fn show(&self, event: &ReactionEvent, session: &ReadSession) -> Transition {
        let key = event.message;
        let view = render_page(&self.endpoints, session, session.current);

        match self
            .surface
            .edit_view(key, &view, &Reaction::NAVIGATION)
            .await
        {
            Ok(()) => {}
            Err(SurfaceError::MessageGone) => {
                info!(code = %session.code, message_id = key.message.0, "Reader message is gone, closing session");
                self.store.remove_reader(key).await;
                return Transition::Gone;
            }
            Err(e) => {
                warn!(code = %session.code, page = session.current + 1, error = %e, "Failed to edit reader");
            }
        }

        self.strip(event).await;
        Transition::Moved {
            page: session.current,
        }
    }

    async fn stop(&self, event: &ReactionEvent) -> Transition {
        let key = event.message;

        let Some(session) = self.store.reader(key).await else {
            return self.reject(event, Rejection::NoSession).await;
        };
        if session.owner != event.user {
            return self.reject(event, Rejection::NotOwner).await;
        }

        // Whoever removes the session deletes the message; later stops find nothing.
        let Some(session) = self.store.remove_reader(key).await else {
            return Transition::Gone;
        };

        match self.surface.delete_message(key).await {
            Ok(()) | Err(SurfaceError::MessageGone) => {}
            Err(e) => warn!(code = %session.code, error = %e, "Failed to delete reader message"),
        }

        info!(code = %session.code, user = %event.user, page = session.current + 1, "Closed reader");
        Transition::Stopped
    }

    async fn reject(&self, event: &ReactionEvent, rejection: Rejection) -> Transition {
        debug!(user = %event.user, message_id = event.message.message.0, ?rejection, "Rejected reaction");
        self.strip(event).await;
        Transition::Rejected(rejection)
    }

    async fn strip(&self, event: &ReactionEvent) {
        if let Err(e) = self.surface.strip_reaction(event).await {
            debug!(user = %event.user, error = %e, "Failed to strip reaction");
        }
    }
}
