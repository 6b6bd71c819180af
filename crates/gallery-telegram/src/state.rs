//! Shared state for the Telegram bot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gallery_core::{AcquireError, Acquirer, GalleryClient, GalleryRecord, ReaderConfig};
use teloxide::types::{ChatId, UserId};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::Result;
use crate::pager::Pager;
use crate::reaction::Reaction;
use crate::render::GallerySummary;
use crate::session::{MessageKey, OriginRecord};
use crate::store::{MemorySessionStore, RetentionPolicy, SessionStore};
use crate::surface::ChatSurface;

/// A summary posted in reply to a gallery command.
#[derive(Debug)]
pub struct PostedGallery {
    pub summary: MessageKey,
    pub record: GalleryRecord,
}

/// State shared by every handler.
pub struct BotState {
    acquirer: Acquirer,
    pager: Pager,
    download_dir: PathBuf,
}

impl BotState {
    pub fn new(
        acquirer: Acquirer,
        store: Arc<dyn SessionStore>,
        surface: Arc<dyn ChatSurface>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        let endpoints = acquirer.client().endpoints().clone();
        Self {
            acquirer,
            pager: Pager::new(store, surface, endpoints),
            download_dir: download_dir.into(),
        }
    }

    /// Build the state from configuration, with an in-memory session store.
    pub fn from_config(config: &ReaderConfig, surface: Arc<dyn ChatSurface>) -> Result<Self> {
        let client = GalleryClient::from_config(config)?;
        let store = Arc::new(MemorySessionStore::new(RetentionPolicy::from_capacity(
            config.origin_capacity,
        )));
        Ok(Self::new(
            Acquirer::http(client),
            store,
            surface,
            config.download_dir.clone(),
        ))
    }

    /// Ignore reactions made by this user (the bot itself).
    pub fn with_bot_user(mut self, user: UserId) -> Self {
        self.pager = self.pager.with_bot_user(user);
        self
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Fetch a gallery, post its summary and remember it for opening readers.
    pub async fn post_gallery(
        &self,
        chat: ChatId,
        requester: UserId,
        code: &str,
    ) -> Result<PostedGallery> {
        let record = self.acquirer.client().fetch_metadata(code).await?;
        let endpoints = self.acquirer.client().endpoints();
        let surface = self.pager.surface();

        let summary = GallerySummary::from_record(&record, endpoints);
        let message = surface.send_summary(chat, &summary).await?;
        let key = MessageKey::new(chat, message);

        let origin = OriginRecord::from_record(&record, chat, requester);
        let has_pages = origin.has_pages();
        self.pager.store().put_origin(key, origin).await;

        if has_pages {
            if let Err(e) = surface.attach_reactions(key, &[Reaction::Open]).await {
                warn!(code = %record.code, error = %e, "Failed to attach open control");
            }
        }

        info!(
            code = %record.code,
            chat_id = %chat,
            message_id = message.0,
            pages = record.pages().len(),
            "Posted gallery summary"
        );
        Ok(PostedGallery {
            summary: key,
            record,
        })
    }

    /// Download a gallery's assets in the background.
    pub fn spawn_acquisition(&self, record: GalleryRecord) -> JoinHandle<()> {
        let acquirer = self.acquirer.clone();
        let root = self.download_dir.clone();

        tokio::spawn(async move {
            let code = record.code.clone();
            match acquirer.acquire_assets(record, &root).await {
                Ok(acquisition) => {
                    info!(code = %code, directory = %acquisition.directory.display(), "Gallery downloaded");
                }
                Err(AcquireError::Partial {
                    directory,
                    asset,
                    source,
                    ..
                }) => {
                    warn!(
                        code = %code,
                        directory = %directory.display(),
                        asset = %asset,
                        error = %source,
                        "Gallery download incomplete"
                    );
                }
                Err(e) => {
                    warn!(code = %code, error = %e, "Gallery download failed");
                }
            }
        })
    }
}

/// Create shared state wrapped in Arc.
pub fn create_shared_state(
    config: &ReaderConfig,
    surface: Arc<dyn ChatSurface>,
    bot_user: Option<UserId>,
) -> Result<Arc<BotState>> {
    let mut state = BotState::from_config(config, surface)?;
    if let Some(user) = bot_user {
        state = state.with_bot_user(user);
    }
    Ok(Arc::new(state))
}
