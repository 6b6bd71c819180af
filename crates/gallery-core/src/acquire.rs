//! Acquisition pipeline: metadata first, then the cover and every page.
//!
//! Downloads run strictly in order and stop at the first failure. Whatever
//! was fetched before the failure is reported back through
//! [`AcquireError::Partial`] and left on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::client::GalleryClient;
use crate::download::Downloader;
use crate::error::{AcquireError, AssetKind};
use crate::model::GalleryRecord;

/// A fully downloaded gallery.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub record: GalleryRecord,
    pub directory: PathBuf,
}

/// File name of a page on disk: 1-based, zero-padded to three digits.
pub fn page_file_name(page: usize, ext: &str) -> String {
    format!("{:03}.{}", page, ext)
}

pub fn cover_file_name(ext: &str) -> String {
    format!("cover.{}", ext)
}

/// Fetches metadata and downloads the assets of galleries.
#[derive(Debug, Clone)]
pub struct Acquirer {
    client: GalleryClient,
    downloader: Downloader,
}

impl Acquirer {
    pub fn new(client: GalleryClient, downloader: Downloader) -> Self {
        Self { client, downloader }
    }

    /// Acquirer over HTTP sharing the client's connection pool.
    pub fn http(client: GalleryClient) -> Self {
        let downloader = Downloader::http(client.http().clone());
        Self::new(client, downloader)
    }

    pub fn client(&self) -> &GalleryClient {
        &self.client
    }

    /// Fetch the metadata of `code` and download everything under `root/code`.
    pub async fn acquire(&self, code: &str, root: &Path) -> Result<Acquisition, AcquireError> {
        let record = self.client.fetch_metadata(code).await?;
        self.acquire_assets(record, root).await
    }

    /// Download the assets of an already fetched record under `root/<code>`.
    pub async fn acquire_assets(
        &self,
        record: GalleryRecord,
        root: &Path,
    ) -> Result<Acquisition, AcquireError> {
        let directory = root.join(&record.code);
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|source| AcquireError::CreateDir {
                path: directory.clone(),
                source,
            })?;

        let endpoints = self.client.endpoints();
        let media_id = record.media_id.clone();

        let mut plan = Vec::with_capacity(record.pages().len() + 1);
        let cover_ext = record.cover_extension();
        plan.push((
            AssetKind::Cover,
            endpoints.cover_url(&media_id, cover_ext),
            cover_file_name(cover_ext),
        ));
        for (index, page) in record.pages().iter().enumerate() {
            let number = index + 1;
            let ext = page.extension();
            plan.push((
                AssetKind::Page(number),
                endpoints.page_url(&media_id, number, ext),
                page_file_name(number, ext),
            ));
        }

        for (asset, url, file_name) in plan {
            let path = directory.join(&file_name);
            debug!(code = %record.code, asset = %asset, path = %path.display(), "Downloading asset");

            if let Err(source) = self.downloader.download(&url, &path).await {
                return Err(AcquireError::Partial {
                    record: Box::new(record),
                    directory,
                    asset,
                    source,
                });
            }
        }

        info!(
            code = %record.code,
            pages = record.pages().len(),
            directory = %directory.display(),
            "Gallery downloaded"
        );
        Ok(Acquisition { record, directory })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_names() {
        assert_eq!(page_file_name(1, "jpg"), "001.jpg");
        assert_eq!(page_file_name(42, "png"), "042.png");
        assert_eq!(page_file_name(1000, "gif"), "1000.gif");
        assert_eq!(cover_file_name("png"), "cover.png");
    }
}
