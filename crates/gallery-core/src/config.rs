//! Shared configuration for the gallery reader.
//!
//! Provides the state directory layout and the runtime settings read from
//! the environment.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.gallery-reader/
//! ├── logs/         # Bot logs (bot_<timestamp>.log)
//! └── config/       # .env.local with secrets
//! ```
//!
//! # Environment Variables
//!
//! - `GALLERY_STATE_DIR`: Override the base state directory
//! - `GALLERY_LOG_DIR`: Override the log directory
//! - `GALLERY_API_BASE`, `GALLERY_THUMB_BASE`, `GALLERY_IMAGE_BASE`: Remote hosts
//! - `GALLERY_USER_AGENT`: User-Agent sent to the gallery API
//! - `GALLERY_DOWNLOAD_DIR`: Root directory for downloaded galleries
//! - `GALLERY_ORIGIN_CAPACITY`: Summary messages kept for opening readers (0 = unbounded)

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::warn;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "GALLERY_STATE_DIR";

/// Environment variable for custom log directory.
pub const LOG_DIR_ENV: &str = "GALLERY_LOG_DIR";

pub const API_BASE_ENV: &str = "GALLERY_API_BASE";
pub const THUMB_BASE_ENV: &str = "GALLERY_THUMB_BASE";
pub const IMAGE_BASE_ENV: &str = "GALLERY_IMAGE_BASE";
pub const USER_AGENT_ENV: &str = "GALLERY_USER_AGENT";
pub const DOWNLOAD_DIR_ENV: &str = "GALLERY_DOWNLOAD_DIR";
pub const ORIGIN_CAPACITY_ENV: &str = "GALLERY_ORIGIN_CAPACITY";

pub const DEFAULT_API_BASE: &str = "https://nhentai.net";
pub const DEFAULT_THUMB_BASE: &str = "https://t.nhentai.net";
pub const DEFAULT_IMAGE_BASE: &str = "https://i.nhentai.net";
pub const DEFAULT_USER_AGENT: &str = "GalleryReader/1.0";
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
pub const DEFAULT_ORIGIN_CAPACITY: usize = 1024;

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".gallery-reader";

const LOGS_SUBDIR: &str = "logs";
const CONFIG_SUBDIR: &str = "config";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the state directory.
///
/// 1. `GALLERY_STATE_DIR` if set
/// 2. `~/.gallery-reader` if the home directory is known
/// 3. `.gallery-reader` in the current directory
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| resolve_state_dir(std::env::var(STATE_DIR_ENV).ok(), dirs::home_dir()))
        .clone()
}

fn resolve_state_dir(override_dir: Option<String>, home: Option<PathBuf>) -> PathBuf {
    match override_dir {
        Some(dir) => PathBuf::from(dir),
        None => home
            .map(|h| h.join(DEFAULT_STATE_DIR))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
    }
}

/// Get the logs directory.
pub fn logs_dir() -> PathBuf {
    resolve_logs_dir(std::env::var(LOG_DIR_ENV).ok(), &state_dir())
}

fn resolve_logs_dir(override_dir: Option<String>, state: &std::path::Path) -> PathBuf {
    override_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| state.join(LOGS_SUBDIR))
}

pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Environment file for secrets (bot token).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Ensure the state directory and its subdirectories exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(logs_dir())?;
    std::fs::create_dir_all(config_dir())?;
    Ok(())
}

/// Base URLs of the gallery API and its image hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub thumb_base: String,
    pub image_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            thumb_base: DEFAULT_THUMB_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every host at one base URL. Used against local mock servers.
    pub fn single(base: &str) -> Self {
        Self {
            api_base: base.to_string(),
            thumb_base: base.to_string(),
            image_base: base.to_string(),
        }
    }

    pub fn gallery_url(&self, code: &str) -> String {
        format!("{}/api/gallery/{}", trim(&self.api_base), code)
    }

    /// Public web page of a gallery, linked from summaries.
    pub fn web_url(&self, code: &str) -> String {
        format!("{}/g/{}", trim(&self.api_base), code)
    }

    pub fn cover_url(&self, media_id: &str, ext: &str) -> String {
        format!("{}/galleries/{}/cover.{}", trim(&self.thumb_base), media_id, ext)
    }

    /// `page` is 1-based and not zero-padded.
    pub fn page_url(&self, media_id: &str, page: usize, ext: &str) -> String {
        format!("{}/galleries/{}/{}.{}", trim(&self.image_base), media_id, page, ext)
    }
}

fn trim(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// Runtime settings for fetching and downloading galleries.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub endpoints: Endpoints,
    pub user_agent: String,
    pub download_dir: PathBuf,
    /// Maximum number of summary messages remembered; `None` keeps all.
    pub origin_capacity: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            origin_capacity: Some(DEFAULT_ORIGIN_CAPACITY),
        }
    }
}

impl ReaderConfig {
    /// Build the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let origin_capacity = match var(ORIGIN_CAPACITY_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(e) => {
                    warn!(value = %raw, error = %e, "Invalid {}, using default", ORIGIN_CAPACITY_ENV);
                    defaults.origin_capacity
                }
            },
            None => defaults.origin_capacity,
        };

        Self {
            endpoints: Endpoints {
                api_base: var(API_BASE_ENV).unwrap_or(defaults.endpoints.api_base),
                thumb_base: var(THUMB_BASE_ENV).unwrap_or(defaults.endpoints.thumb_base),
                image_base: var(IMAGE_BASE_ENV).unwrap_or(defaults.endpoints.image_base),
            },
            user_agent: var(USER_AGENT_ENV).unwrap_or(defaults.user_agent),
            download_dir: var(DOWNLOAD_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            origin_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_state_dir_resolution() {
        assert_eq!(
            resolve_state_dir(None, Some(PathBuf::from("/home/reader"))),
            PathBuf::from("/home/reader/.gallery-reader")
        );
        assert_eq!(
            resolve_state_dir(Some("/srv/gallery".to_string()), Some(PathBuf::from("/home/reader"))),
            PathBuf::from("/srv/gallery")
        );
        assert_eq!(resolve_state_dir(None, None), PathBuf::from(".gallery-reader"));
    }

    #[test]
    fn test_logs_dir_resolution() {
        let state = PathBuf::from("/home/reader/.gallery-reader");
        assert_eq!(
            resolve_logs_dir(None, &state),
            PathBuf::from("/home/reader/.gallery-reader/logs")
        );
        assert_eq!(
            resolve_logs_dir(Some("/var/log/gallery".to_string()), &state),
            PathBuf::from("/var/log/gallery")
        );
    }

    #[test]
    fn test_origin_capacity_parsing() {
        let capacity = |raw: &str| {
            ReaderConfig::from_lookup(lookup(&[(ORIGIN_CAPACITY_ENV, raw)])).origin_capacity
        };

        assert_eq!(capacity("0"), None);
        assert_eq!(capacity("5"), Some(5));
        assert_eq!(capacity(" 7 "), Some(7));
        assert_eq!(capacity("abc"), Some(DEFAULT_ORIGIN_CAPACITY));
        assert_eq!(capacity("-1"), Some(DEFAULT_ORIGIN_CAPACITY));
        assert_eq!(capacity(""), Some(DEFAULT_ORIGIN_CAPACITY));
        assert_eq!(capacity("   "), Some(DEFAULT_ORIGIN_CAPACITY));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = ReaderConfig::from_lookup(lookup(&[
            (API_BASE_ENV, "http://api.local"),
            (THUMB_BASE_ENV, "http://thumbs.local"),
            (IMAGE_BASE_ENV, ""),
            (USER_AGENT_ENV, "ReaderTest/2.0"),
            (DOWNLOAD_DIR_ENV, "/tmp/galleries"),
        ]));

        assert_eq!(config.endpoints.api_base, "http://api.local");
        assert_eq!(config.endpoints.thumb_base, "http://thumbs.local");
        assert_eq!(config.endpoints.image_base, DEFAULT_IMAGE_BASE);
        assert_eq!(config.user_agent, "ReaderTest/2.0");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/galleries"));
        assert_eq!(config.origin_capacity, Some(DEFAULT_ORIGIN_CAPACITY));
    }

    #[test]
    fn test_empty_lookup_gives_defaults() {
        let config = ReaderConfig::from_lookup(|_| None);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.download_dir, PathBuf::from(DEFAULT_DOWNLOAD_DIR));
    }

    #[test]
    fn test_env_file_name() {
        assert!(env_file().ends_with(".env.local"));
    }

    #[test]
    fn test_default_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.gallery_url("123456"), "https://nhentai.net/api/gallery/123456");
        assert_eq!(endpoints.web_url("123456"), "https://nhentai.net/g/123456");
        assert_eq!(
            endpoints.cover_url("998877", "png"),
            "https://t.nhentai.net/galleries/998877/cover.png"
        );
        assert_eq!(
            endpoints.page_url("998877", 12, "gif"),
            "https://i.nhentai.net/galleries/998877/12.gif"
        );
    }

    #[test]
    fn test_single_base_trims_slash() {
        let endpoints = Endpoints::single("http://127.0.0.1:9999/");
        assert_eq!(endpoints.gallery_url("1"), "http://127.0.0.1:9999/api/gallery/1");
        assert_eq!(endpoints.page_url("m", 1, "jpg"), "http://127.0.0.1:9999/galleries/m/1.jpg");
    }

    #[test]
    fn test_reader_config_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.download_dir, PathBuf::from("./downloads"));
        assert_eq!(config.origin_capacity, Some(DEFAULT_ORIGIN_CAPACITY));
    }
}
