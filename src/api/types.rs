use crate::util::decode_entities;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

pub type PostId = u64;
pub type MediaId = u64;
pub type CategoryId = u64;

/// Category id to display name, ordered by id for stable pickers.
pub type CategoryIndex = BTreeMap<CategoryId, String>;

// ============================================================================
// Post Status
// ============================================================================

/// Publication status of a post.
///
/// The console lists and edits `publish`, `draft` and `trash`. WordPress has a
/// few more statuses; they decode into their own variants (or `Other`) so a
/// listing never fails because of an unexpected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    Draft,
    Trash,
    Pending,
    Private,
    Future,
    #[serde(other)]
    Other,
}

impl PostStatus {
    /// Statuses requested by the post listing by default.
    pub const LISTED: [PostStatus; 3] = [PostStatus::Publish, PostStatus::Draft, PostStatus::Trash];

    /// Statuses a post can be given from the form.
    pub const EDITABLE: [PostStatus; 2] = [PostStatus::Publish, PostStatus::Draft];

    /// Wire name used in query strings and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Trash => "trash",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Future => "future",
            Self::Other => "other",
        }
    }

    /// Parse a wire name (case-insensitive). `Other` is never produced.
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publish" => Some(Self::Publish),
            "draft" => Some(Self::Draft),
            "trash" => Some(Self::Trash),
            "pending" => Some(Self::Pending),
            "private" => Some(Self::Private),
            "future" => Some(Self::Future),
            _ => None,
        }
    }

    pub fn is_editable(self) -> bool {
        Self::EDITABLE.contains(&self)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Post
// ============================================================================

/// A `{ rendered, raw }` pair as returned for titles and content.
///
/// `raw` is only present when the request used `context=edit`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RenderedField {
    #[serde(default)]
    pub rendered: String,
    #[serde(default)]
    pub raw: Option<String>,
}

impl RenderedField {
    /// Build a field holding the same raw and rendered text.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            rendered: text.clone(),
            raw: Some(text),
        }
    }

    /// Editable text: `raw` when available, otherwise `rendered` with
    /// HTML entities decoded.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.raw {
            Some(raw) => Cow::Borrowed(raw.as_str()),
            None => decode_entities(&self.rendered),
        }
    }
}

/// A blog post as returned by `/wp/v2/posts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub title: RenderedField,
    #[serde(default)]
    pub content: RenderedField,
    pub status: PostStatus,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    /// Raw featured media reference. Anything that is not a positive
    /// integer means "no image".
    #[serde(default, deserialize_with = "lenient_media_ref")]
    pub featured_media: Option<i64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub modified: Option<NaiveDateTime>,
}

impl Post {
    /// The media id to resolve, if the post references an image at all.
    pub fn media_ref(&self) -> Option<MediaId> {
        self.featured_media
            .filter(|&id| id > 0)
            .and_then(|id| MediaId::try_from(id).ok())
    }

    /// The post's category. Posts carry a list; the console uses the first.
    pub fn category(&self) -> Option<CategoryId> {
        self.categories.first().copied()
    }

    pub fn title_text(&self) -> Cow<'_, str> {
        self.title.text()
    }
}

fn lenient_media_ref<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

/// Body for create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub categories: Vec<CategoryId>,
    pub status: PostStatus,
    /// Only sent when a new image was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<MediaId>,
}

// ============================================================================
// Categories and Media
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Build the id -> name index used by the list and the form picker.
pub fn index_categories(categories: Vec<Category>) -> CategoryIndex {
    categories
        .into_iter()
        .map(|c| (c.id, decode_entities(&c.name).into_owned()))
        .collect()
}

/// A media library item. Only the fields the console needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub source_url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// A file to be uploaded to the media library.
#[derive(Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub alt_text: String,
}

impl std::fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .field("alt_text", &self.alt_text)
            .finish()
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Response of the JWT token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_nicename: Option<String>,
    #[serde(default)]
    pub user_display_name: Option<String>,
}

/// Response of `/wp/v2/users/me`, used to verify basic credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_JSON: &str = r#"{
        "id": 42,
        "date": "2024-10-05T09:30:00",
        "modified": "2024-10-06T10:00:00",
        "link": "http://localhost/wp/?p=42",
        "status": "draft",
        "title": { "rendered": "Tom &amp; Jerry&#8217;s day", "raw": "Tom & Jerry's day" },
        "content": { "rendered": "<p>Hello</p>\n", "raw": "<p>Hello</p>" },
        "categories": [7, 3],
        "featured_media": 15
    }"#;

    #[test]
    fn test_post_decodes_edit_context() {
        let post: Post = serde_json::from_str(POST_JSON).unwrap();
        assert_eq!(post.id, 42);
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.title_text(), "Tom & Jerry's day");
        assert_eq!(post.category(), Some(7));
        assert_eq!(post.media_ref(), Some(15));
        assert!(post.modified.is_some());
    }

    #[test]
    fn test_rendered_title_entities_decoded_without_raw() {
        let post: Post = serde_json::from_str(
            r#"{"id":1,"status":"publish","title":{"rendered":"Tom &amp; Jerry&#8217;s"}}"#,
        )
        .unwrap();
        assert_eq!(post.title_text(), "Tom & Jerry\u{2019}s");
    }

    #[test]
    fn test_media_ref_non_positive_or_missing() {
        for raw in [
            r#"{"id":1,"status":"publish"}"#,
            r#"{"id":1,"status":"publish","featured_media":0}"#,
            r#"{"id":1,"status":"publish","featured_media":-4}"#,
            r#"{"id":1,"status":"publish","featured_media":null}"#,
            r#"{"id":1,"status":"publish","featured_media":"12"}"#,
        ] {
            let post: Post = serde_json::from_str(raw).unwrap();
            assert_eq!(post.media_ref(), None, "input: {}", raw);
        }
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let post: Post =
            serde_json::from_str(r#"{"id":1,"status":"auto-draft"}"#).unwrap();
        assert_eq!(post.status, PostStatus::Other);
        assert!(!post.status.is_editable());
    }

    #[test]
    fn test_payload_omits_featured_media_when_none() {
        let payload = PostPayload {
            title: "T".into(),
            content: "C".into(),
            categories: vec![3],
            status: PostStatus::Publish,
            featured_media: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "publish");
        assert_eq!(json["categories"], serde_json::json!([3]));
        assert!(json.get("featured_media").is_none());
    }

    #[test]
    fn test_status_names_roundtrip() {
        for status in PostStatus::LISTED {
            assert_eq!(PostStatus::from_str_name(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::from_str_name(" Draft "), Some(PostStatus::Draft));
        assert_eq!(PostStatus::from_str_name("bogus"), None);
    }

    #[test]
    fn test_index_categories_decodes_names() {
        let index = index_categories(vec![
            Category {
                id: 9,
                name: "News &amp; Events".into(),
            },
            Category {
                id: 1,
                name: "Uncategorized".into(),
            },
        ]);
        let ids: Vec<_> = index.keys().copied().collect();
        assert_eq!(ids, vec![1, 9]);
        assert_eq!(index[&9], "News & Events");
    }
}
