//! Telegram bot interface for the gallery reader.
//!
//! `/gallery <code>` posts a summary of a gallery and downloads its images
//! in the background. Pressing 📖 under the summary opens a reader message
//! owned by whoever pressed it; ⬅️ and ➡️ turn pages and ⏹️ closes it.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional: the `GALLERY_*` variables read by [`gallery_core::ReaderConfig`].
//!
//! # Example
//!
//! ```no_run
//! use gallery_core::ReaderConfig;
//! use gallery_telegram::ReaderBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bot = ReaderBot::new(ReaderConfig::from_env())?;
//!     let (_, bot_user) = bot.get_me().await?;
//!     bot.start_polling(bot_user).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//! - `/gallery <code>` - Show a gallery

pub mod bot;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod pager;
pub mod reaction;
pub mod render;
pub mod session;
pub mod state;
pub mod store;
pub mod surface;

pub use bot::ReaderBot;
pub use error::{Result, TelegramError};
pub use logging::init_logging;
pub use pager::{Pager, Rejection, Transition};
pub use reaction::{Reaction, ReactionEvent};
pub use render::{render_page, GallerySummary, PageView};
pub use session::{MessageKey, OriginRecord, ReadSession};
pub use state::{create_shared_state, BotState, PostedGallery};
pub use store::{MemorySessionStore, RetentionPolicy, SessionStore, SwapOutcome};
pub use surface::{ChatSurface, SurfaceError, TelegramSurface};
