//! Gallery metadata as returned by the gallery API.

use serde::{Deserialize, Serialize};

use crate::extension::{resolve_extension, DEFAULT_EXTENSION};

/// Parsed gallery metadata.
///
/// `code` is supplied by the caller and is not part of the payload. Page
/// iteration always follows `images.pages`; `num_pages` is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryRecord {
    #[serde(skip)]
    pub code: String,
    pub media_id: String,
    pub title: GalleryTitle,
    pub images: GalleryImages,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub num_pages: usize,
}

/// Title variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryTitle {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub japanese: Option<String>,
    #[serde(default)]
    pub pretty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryImages {
    #[serde(default)]
    pub pages: Vec<PageDescriptor>,
}

/// One page of a gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// One-character image type token.
    #[serde(rename = "t")]
    pub kind: String,
    #[serde(rename = "w", default)]
    pub width: Option<u32>,
    #[serde(rename = "h", default)]
    pub height: Option<u32>,
}

impl PageDescriptor {
    pub fn extension(&self) -> &'static str {
        resolve_extension(&self.kind)
    }
}

/// Tag discriminator. Only the first three are shown in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Artist,
    Language,
    Tag,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "type")]
    pub kind: TagKind,
    pub name: String,
}

impl GalleryRecord {
    /// Attach the lookup code to a freshly parsed record.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.images.pages
    }

    /// Title for display, preferring the pretty variant.
    pub fn display_title(&self) -> &str {
        [&self.title.pretty, &self.title.english, &self.title.japanese]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|t| !t.trim().is_empty())
            .unwrap_or(&self.code)
    }

    /// Extension of every page, in order.
    pub fn page_extensions(&self) -> Vec<String> {
        self.pages()
            .iter()
            .map(|p| p.extension().to_string())
            .collect()
    }

    /// Cover extension follows the first page; jpg when there are no pages.
    pub fn cover_extension(&self) -> &'static str {
        self.pages()
            .first()
            .map(PageDescriptor::extension)
            .unwrap_or(DEFAULT_EXTENSION)
    }

    /// Names of all tags of the given kind, in payload order.
    pub fn tag_names(&self, kind: TagKind) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "id": 123456,
        "media_id": "998877",
        "title": {"english": "Sample English", "japanese": null, "pretty": "Sample"},
        "images": {
            "pages": [{"t": "j", "w": 1280, "h": 1810}, {"t": "p"}, {"t": "g"}],
            "cover": {"t": "j"},
            "thumbnail": {"t": "j"}
        },
        "tags": [
            {"id": 1, "type": "artist", "name": "someone", "url": "/artist/someone/", "count": 3},
            {"id": 2, "type": "language", "name": "english"},
            {"id": 3, "type": "tag", "name": "full color"},
            {"id": 4, "type": "parody", "name": "original"}
        ],
        "num_pages": 3
    }"#;

    #[test]
    fn test_parse_payload() {
        let record: GalleryRecord = serde_json::from_str(PAYLOAD).unwrap();
        let record = record.with_code("123456");

        assert_eq!(record.code, "123456");
        assert_eq!(record.media_id, "998877");
        assert_eq!(record.display_title(), "Sample");
        assert_eq!(record.pages().len(), 3);
        assert_eq!(record.num_pages, 3);
        assert_eq!(record.pages()[0].width, Some(1280));
        assert_eq!(record.tags[3].kind, TagKind::Other);
    }

    #[test]
    fn test_page_extensions() {
        let record: GalleryRecord = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(record.page_extensions(), vec!["jpg", "png", "gif"]);
        assert_eq!(record.cover_extension(), "jpg");
    }

    #[test]
    fn test_cover_extension_without_pages() {
        let record: GalleryRecord = serde_json::from_str(
            r#"{"media_id": "1", "title": {}, "images": {"pages": []}, "num_pages": 0}"#,
        )
        .unwrap();
        assert_eq!(record.cover_extension(), "jpg");
        assert!(record.page_extensions().is_empty());
    }

    #[test]
    fn test_tag_names_by_kind() {
        let record: GalleryRecord = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(record.tag_names(TagKind::Artist), vec!["someone"]);
        assert_eq!(record.tag_names(TagKind::Language), vec!["english"]);
        assert_eq!(record.tag_names(TagKind::Tag), vec!["full color"]);
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut record: GalleryRecord = serde_json::from_str(PAYLOAD).unwrap();
        record.title.pretty = Some("  ".to_string());
        assert_eq!(record.display_title(), "Sample English");

        record.title = GalleryTitle::default();
        let record = record.with_code("42");
        assert_eq!(record.display_title(), "42");
    }

    #[test]
    fn test_missing_media_id_is_rejected() {
        let result = serde_json::from_str::<GalleryRecord>(r#"{"title": {}, "images": {"pages": []}}"#);
        assert!(result.is_err());
    }
}
