//! Gallery Core - metadata and asset acquisition for the gallery reader.
//!
//! - **extension**: Image type token to file extension mapping
//! - **model**: Gallery metadata records
//! - **client**: Metadata fetcher for the gallery API
//! - **download**: Single-asset downloads with bounded retries
//! - **acquire**: Metadata + cover + pages pipeline
//! - **config**: State directories and runtime settings

pub mod acquire;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod extension;
pub mod model;

pub use acquire::{cover_file_name, page_file_name, Acquirer, Acquisition};
pub use client::{is_valid_code, GalleryClient};
pub use config::{ensure_all_dirs, env_file, logs_dir, state_dir, Endpoints, ReaderConfig};
pub use download::{
    AssetBody, AssetTransport, Downloader, HttpTransport, RetryPolicy, Sleeper, TokioSleeper,
};
pub use error::{AcquireError, AssetKind, DownloadError, FetchError};
pub use extension::{resolve_extension, DEFAULT_EXTENSION};
pub use model::{GalleryImages, GalleryRecord, GalleryTitle, PageDescriptor, Tag, TagKind};
