//! Gallery Reader Telegram Bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p gallery-telegram
//! ```

use std::path::PathBuf;

use clap::Parser;
use gallery_core::{config, ReaderConfig};
use gallery_telegram::{init_logging, ReaderBot};

/// Gallery Reader Bot - look up galleries and page through them in Telegram
#[derive(Parser, Debug)]
#[command(name = "gallery-telegram")]
#[command(about = "Telegram bot for looking up and reading galleries")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Root directory for downloaded galleries
    #[arg(short, long, env = "GALLERY_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Remove the registered commands on shutdown
    #[arg(long)]
    remove_commands: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from config directory first
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    // Also try local .env.local or .env
    let _ = dotenvy::from_filename(".env.local")
        .or_else(|_| dotenvy::dotenv());

    let args = Args::parse();

    let log_path = init_logging(args.verbose);

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let mut reader_config = ReaderConfig::from_env();
    if let Some(dir) = args.download_dir {
        reader_config.download_dir = dir;
    }

    let bot = ReaderBot::new(reader_config.clone())?;

    let bot_user = match bot.get_me().await {
        Ok((username, user_id)) => {
            tracing::info!(username = %username, user_id = %user_id, "Bot initialized successfully");
            println!("\n[book] Gallery Reader Bot");
            println!("   Bot: @{}", username);
            println!("   Downloads: {}", reader_config.download_dir.display());
            if let Some(path) = &log_path {
                println!("   Log: {}", path.display());
            }
            user_id
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    };

    if let Err(e) = bot.register_commands().await {
        tracing::warn!(error = %e, "Failed to register commands");
    }

    println!("\n[phone] Open Telegram and send /gallery <code> to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling(bot_user).await?;

    if args.remove_commands {
        if let Err(e) = bot.remove_commands().await {
            tracing::warn!(error = %e, "Failed to remove commands");
        }
    }

    Ok(())
}
