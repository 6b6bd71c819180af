//! Page views and gallery summaries.

use gallery_core::{Endpoints, GalleryRecord, TagKind};
use tracing::{debug, warn};

use crate::session::ReadSession;

/// Maximum number of descriptive tags listed in a summary.
pub const MAX_SUMMARY_TAGS: usize = 5;

/// Telegram caps photo captions at 1024 characters.
const MAX_TITLE_CHARS: usize = 256;

/// Shown above every summary.
pub const CONTENT_NOTICE: &str = "🔞 NSFW Content";

/// What a reader message shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    Page { image_url: String, caption: String },
    /// Shown instead of a page that does not exist.
    Error { title: String, description: String },
}

impl PageView {
    /// Plain text form, used when a view cannot carry an image.
    pub fn text(&self) -> String {
        match self {
            PageView::Page { caption, .. } => caption.clone(),
            PageView::Error { title, description } => format!("{}\n{}", title, description),
        }
    }
}

/// Render `page` (0-based) of a reader session.
pub fn render_page(endpoints: &Endpoints, session: &ReadSession, page: usize) -> PageView {
    let Some(ext) = session.page_exts.get(page) else {
        warn!(
            code = %session.code,
            page,
            total = session.page_exts.len(),
            "Invalid page index"
        );
        return PageView::Error {
            title: format!("{} — Error", session.code),
            description: "Invalid page number".to_string(),
        };
    };

    let image_url = endpoints.page_url(&session.media_id, page + 1, ext);
    debug!(code = %session.code, page = page + 1, total = session.total, url = %image_url, "Rendering page");

    PageView::Page {
        image_url,
        caption: format!("{} — Page {}/{}", session.code, page + 1, session.total),
    }
}

/// Escape HTML special characters for Telegram HTML mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Everything shown in a gallery summary message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GallerySummary {
    pub code: String,
    pub title: String,
    pub url: String,
    pub pages: usize,
    pub artists: Vec<String>,
    pub languages: Vec<String>,
    /// At most [`MAX_SUMMARY_TAGS`].
    pub tags: Vec<String>,
    /// Present when the gallery has pages.
    pub cover_url: Option<String>,
}

impl GallerySummary {
    pub fn from_record(record: &GalleryRecord, endpoints: &Endpoints) -> Self {
        let owned = |names: Vec<&str>| names.into_iter().map(str::to_string).collect::<Vec<_>>();

        let cover_url = (!record.pages().is_empty())
            .then(|| endpoints.cover_url(&record.media_id, record.cover_extension()));

        let mut tags = owned(record.tag_names(TagKind::Tag));
        tags.truncate(MAX_SUMMARY_TAGS);

        Self {
            code: record.code.clone(),
            title: record.display_title().to_string(),
            url: endpoints.web_url(&record.code),
            pages: record.num_pages,
            artists: owned(record.tag_names(TagKind::Artist)),
            languages: owned(record.tag_names(TagKind::Language)),
            tags,
            cover_url,
        }
    }

    /// HTML caption for the summary message.
    pub fn to_html(&self) -> String {
        let mut lines = vec![
            CONTENT_NOTICE.to_string(),
            String::new(),
            format!(
                "<b><a href=\"{}\">{}</a></b>",
                html_escape(&self.url),
                html_escape(&truncate_chars(&self.title, MAX_TITLE_CHARS))
            ),
            format!("<b>Pages:</b> {}", self.pages),
        ];

        if !self.artists.is_empty() {
            lines.push(format!("<b>Artists:</b> {}", html_escape(&self.artists.join(", "))));
        }
        if !self.languages.is_empty() {
            lines.push(format!("<b>Languages:</b> {}", html_escape(&self.languages.join(", "))));
        }
        if !self.tags.is_empty() {
            lines.push(format!("<b>Tags:</b> {}", html_escape(&self.tags.join(", "))));
        }

        lines.push(String::new());
        lines.push(format!("<i>Code: {}</i>", html_escape(&self.code)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::{ChatId, UserId};

    fn session() -> ReadSession {
        ReadSession {
            owner: UserId(7),
            media_id: "998877".to_string(),
            page_exts: vec!["jpg".to_string(), "png".to_string(), "gif".to_string()],
            current: 0,
            total: 3,
            chat: ChatId(1),
            code: "123456".to_string(),
        }
    }

    fn record() -> GalleryRecord {
        let record: GalleryRecord = serde_json::from_str(
            r#"{
                "media_id": "998877",
                "title": {"pretty": "A <Title> & more"},
                "images": {"pages": [{"t": "p"}, {"t": "j"}]},
                "tags": [
                    {"type": "artist", "name": "alice"},
                    {"type": "artist", "name": "bob"},
                    {"type": "language", "name": "english"},
                    {"type": "tag", "name": "t1"}, {"type": "tag", "name": "t2"},
                    {"type": "tag", "name": "t3"}, {"type": "tag", "name": "t4"},
                    {"type": "tag", "name": "t5"}, {"type": "tag", "name": "t6"},
                    {"type": "character", "name": "ignored"}
                ],
                "num_pages": 2
            }"#,
        )
        .unwrap();
        record.with_code("123456")
    }

    #[test]
    fn test_render_page() {
        let view = render_page(&Endpoints::default(), &session(), 1);
        assert_eq!(
            view,
            PageView::Page {
                image_url: "https://i.nhentai.net/galleries/998877/2.png".to_string(),
                caption: "123456 — Page 2/3".to_string(),
            }
        );
    }

    #[test]
    fn test_render_out_of_range_is_error_view() {
        let view = render_page(&Endpoints::default(), &session(), 3);
        assert_eq!(
            view,
            PageView::Error {
                title: "123456 — Error".to_string(),
                description: "Invalid page number".to_string(),
            }
        );
        assert_eq!(view.text(), "123456 — Error\nInvalid page number");
    }

    #[test]
    fn test_summary_fields() {
        let summary = GallerySummary::from_record(&record(), &Endpoints::default());

        assert_eq!(summary.title, "A <Title> & more");
        assert_eq!(summary.url, "https://nhentai.net/g/123456");
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.artists, vec!["alice", "bob"]);
        assert_eq!(summary.languages, vec!["english"]);
        assert_eq!(summary.tags, vec!["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(
            summary.cover_url.as_deref(),
            Some("https://t.nhentai.net/galleries/998877/cover.png")
        );
    }

    #[test]
    fn test_summary_html_escapes_title() {
        let html = GallerySummary::from_record(&record(), &Endpoints::default()).to_html();

        assert!(html.starts_with(CONTENT_NOTICE));
        assert!(html.contains("A &lt;Title&gt; &amp; more"));
        assert!(html.contains("<b>Artists:</b> alice, bob"));
        assert!(html.contains("<i>Code: 123456</i>"));
        assert!(!html.contains("ignored"));
    }

    #[test]
    fn test_summary_without_pages_or_tags() {
        let record: GalleryRecord = serde_json::from_str(
            r#"{"media_id": "1", "title": {"pretty": "Bare"}, "images": {"pages": []}, "num_pages": 0}"#,
        )
        .unwrap();
        let summary = GallerySummary::from_record(&record.with_code("9"), &Endpoints::default());

        assert!(summary.cover_url.is_none());
        let html = summary.to_html();
        assert!(!html.contains("Artists"));
        assert!(!html.contains("Tags"));
    }

    #[test]
    fn test_long_title_is_truncated() {
        let long = "x".repeat(1000);
        let truncated = truncate_chars(&long, MAX_TITLE_CHARS);
        assert_eq!(truncated.chars().count(), MAX_TITLE_CHARS);
        assert!(truncated.ends_with('…'));
    }
}
