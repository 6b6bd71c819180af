//! Error types for gallery acquisition.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::GalleryRecord;

/// Errors returned by the metadata fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The code is empty or contains characters other than ASCII letters and digits.
    #[error("invalid gallery code: {0:?}")]
    InvalidCode(String),

    /// The remote API does not know this code.
    #[error("code {code} not found")]
    NotFound { code: String },

    /// The remote API answered with a non-success status other than 404.
    #[error("API returned status {status}")]
    UnexpectedStatus { status: u16 },

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The body is not JSON matching the gallery schema.
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors returned by a single asset download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The asset host answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The request could not be sent or the body stream broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// The destination file could not be created or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which asset of a gallery failed to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Cover,
    /// 1-based page number.
    Page(usize),
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Cover => write!(f, "cover"),
            AssetKind::Page(n) => write!(f, "page {}", n),
        }
    }
}

/// Errors returned by the acquisition pipeline.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Metadata could not be fetched; nothing was written to disk.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The per-gallery directory could not be created.
    #[error("failed to create destination directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata succeeded but an asset failed. Assets downloaded before the
    /// failure stay on disk.
    #[error("failed to download {asset}: {source}")]
    Partial {
        record: Box<GalleryRecord>,
        directory: PathBuf,
        asset: AssetKind,
        #[source]
        source: DownloadError,
    },
}

impl AcquireError {
    /// The record and directory obtained before a partial failure.
    pub fn partial(&self) -> Option<(&GalleryRecord, &std::path::Path)> {
        match self {
            AcquireError::Partial {
                record, directory, ..
            } => Some((record.as_ref(), directory.as_path())),
            _ => None,
        }
    }
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, FetchError>;
