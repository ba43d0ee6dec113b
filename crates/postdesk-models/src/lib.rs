#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Postdesk posts API.
//!
//! The backend speaks loosely typed JSON: text fields may be missing or `null`,
//! timestamps may be absent, and `category` is not guaranteed to be a list.
//! These types absorb that looseness at the edge so the rest of the client can
//! work with plain values, while keeping malformed categories visible so the
//! filter can fail closed on them.
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Awaiting review; editable.
    #[default]
    Draft,
    /// Visible to readers.
    Published,
}

impl PostStatus {
    /// Wire representation used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// Discriminant selecting which field carries the effective body of a post.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// Inline rich HTML content.
    #[default]
    Normal,
    /// Externally hosted page referenced by `emagPage`.
    Emagazine,
}

/// Category assignment as received from the server.
///
/// Anything other than an array of strings is kept as [`Category::Malformed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    /// Well-formed ordered list of category names.
    List(Vec<String>),
    /// Raw value that was not a list of strings.
    Malformed(Value),
}

impl Default for Category {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Category {
    /// Borrow the category names when the value is well formed.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Malformed(_) => None,
        }
    }

    /// Exact membership test; malformed categories never match.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.as_list()
            .is_some_and(|items| items.iter().any(|item| item == name))
    }

    /// Comma-joined names, or an empty string for malformed values.
    #[must_use]
    pub fn joined(&self) -> String {
        self.as_list().map(|items| items.join(", ")).unwrap_or_default()
    }
}

impl From<Vec<String>> for Category {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// A post as returned by `GET /posts` and `GET /posts/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Server-assigned identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Headline.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Byline.
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    /// Short summary shown under the headline.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sapo: String,
    /// Thumbnail image URL.
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: String,
    /// Free-text hashtags, searched by substring.
    #[serde(default, deserialize_with = "lenient_string")]
    pub tags: String,
    /// Category assignment.
    #[serde(default)]
    pub category: Category,
    /// Publication state; unknown values read as [`PostStatus::Draft`].
    #[serde(default, deserialize_with = "lenient_enum")]
    pub status: PostStatus,
    /// Creation timestamp; `None` when absent or unparsable.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Body discriminant; unknown values read as [`PostKind::Normal`].
    #[serde(rename = "type", default, deserialize_with = "lenient_enum")]
    pub kind: PostKind,
    /// Rich HTML content for normal posts.
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    /// External page for emagazine posts.
    #[serde(default, deserialize_with = "lenient_string")]
    pub emag_page: String,
}

/// Effective body of a post, selected by [`PostKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostBody<'a> {
    /// Inline HTML content.
    Html(&'a str),
    /// Externally hosted page to embed.
    External(&'a str),
    /// Emagazine post without a page reference.
    Missing,
}

impl Post {
    /// Select the effective body. Emagazine posts never fall back to `content`.
    #[must_use]
    pub fn body(&self) -> PostBody<'_> {
        match self.kind {
            PostKind::Normal => PostBody::Html(&self.content),
            PostKind::Emagazine => {
                let page = self.emag_page.trim();
                if page.is_empty() {
                    PostBody::Missing
                } else {
                    PostBody::External(page)
                }
            }
        }
    }
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    /// Headline.
    pub title: String,
    /// Short summary.
    pub sapo: String,
    /// Byline.
    pub author: String,
    /// Category names.
    pub category: Vec<String>,
    /// Free-text hashtags.
    pub tags: String,
    /// Thumbnail image URL.
    pub thumbnail: String,
    /// Body discriminant.
    #[serde(rename = "type")]
    pub kind: PostKind,
    /// External page; empty for normal posts.
    pub emag_page: String,
    /// HTML content; empty for emagazine posts.
    pub content: String,
    /// Client-side creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Always [`PostStatus::Draft`] for new posts.
    pub status: PostStatus,
}

/// Body of `PUT /posts/:id`.
///
/// The update is a full replacement of the editable fields, so it is seeded
/// from the cached post and then overridden field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    /// Headline.
    pub title: String,
    /// Short summary.
    pub sapo: String,
    /// Byline.
    pub author: String,
    /// Thumbnail image URL.
    pub thumbnail: String,
    /// Free-text hashtags.
    pub tags: String,
    /// HTML content.
    pub content: String,
}

impl From<&Post> for PostUpdate {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            sapo: post.sapo.clone(),
            author: post.author.clone(),
            thumbnail: post.thumbnail.clone(),
            tags: post.tags.clone(),
            content: post.content.clone(),
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer credential for subsequent requests.
    pub token: String,
    /// Opaque user profile echoed by the server.
    #[serde(default)]
    pub user: Value,
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Public URL of the stored image.
    pub url: String,
}

/// Error payload carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// Body parsed as JSON.
    Json(Value),
    /// Body that was not valid JSON.
    Text(String),
    /// No body at all.
    Empty,
}

impl ErrorBody {
    /// Classify raw response bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        serde_json::from_slice::<Value>(bytes).map_or_else(
            |_| Self::Text(String::from_utf8_lossy(bytes).trim().to_string()),
            Self::Json,
        )
    }

    /// Human-readable message, preferring the server's `error` or `message` field.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Json(value) => value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| value.as_str().map(str::to_string)),
            Self::Text(text) => Some(text.clone()),
            Self::Empty => None,
        }
    }
}

/// Text field that tolerates `null`, numbers and booleans. Other shapes
/// read as empty so one odd post cannot fail a whole listing.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

fn lenient_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Some(Value::Number(number)) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_accepts_loose_server_payload() {
        let post: Post = serde_json::from_value(json!({
            "_id": "65a1",
            "title": null,
            "category": ["travel", "food"],
            "status": "published",
            "createdAt": "2024-03-01T10:00:00.000Z"
        }))
        .expect("post should decode");

        assert_eq!(post.id, "65a1");
        assert_eq!(post.title, "");
        assert_eq!(post.author, "");
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.kind, PostKind::Normal);
        assert!(post.category.contains("food"));
        assert_eq!(post.category.joined(), "travel, food");
        assert!(post.created_at.is_some());
    }

    #[test]
    fn malformed_category_is_preserved_and_never_matches() {
        let post: Post = serde_json::from_value(json!({
            "_id": "1",
            "category": "travel"
        }))
        .expect("post should decode");

        assert!(matches!(post.category, Category::Malformed(_)));
        assert!(!post.category.contains("travel"));
        assert_eq!(post.category.joined(), "");
    }

    #[test]
    fn odd_fields_do_not_reject_the_post() {
        let posts: Vec<Post> = serde_json::from_value(json!([
            { "_id": "1", "title": 42, "status": "archived", "type": "video" },
            { "_id": "2", "title": { "vi": "x" }, "author": true, "status": "published" }
        ]))
        .expect("listing should decode");

        assert_eq!(posts[0].title, "42");
        assert_eq!(posts[0].status, PostStatus::Draft);
        assert_eq!(posts[0].kind, PostKind::Normal);
        assert_eq!(posts[1].title, "");
        assert_eq!(posts[1].author, "true");
        assert_eq!(posts[1].status, PostStatus::Published);
    }

    #[test]
    fn unparsable_timestamp_becomes_none() {
        let post: Post = serde_json::from_value(json!({
            "_id": "1",
            "createdAt": "yesterday"
        }))
        .expect("post should decode");
        assert!(post.created_at.is_none());
    }

    #[test]
    fn emagazine_body_never_falls_back_to_content() {
        let mut post: Post = serde_json::from_value(json!({
            "_id": "1",
            "type": "emagazine",
            "emagPage": "https://example.canva.site/issue-1",
            "content": "<p>stale</p>"
        }))
        .expect("post should decode");

        assert_eq!(
            post.body(),
            PostBody::External("https://example.canva.site/issue-1")
        );

        post.emag_page.clear();
        assert_eq!(post.body(), PostBody::Missing);

        post.kind = PostKind::Normal;
        assert_eq!(post.body(), PostBody::Html("<p>stale</p>"));
    }

    #[test]
    fn draft_serializes_with_wire_names() {
        let draft = PostDraft {
            title: "t".into(),
            sapo: "s".into(),
            author: "a".into(),
            category: vec!["emagazine".into()],
            tags: "#x".into(),
            thumbnail: "https://img".into(),
            kind: PostKind::Emagazine,
            emag_page: "https://page".into(),
            content: String::new(),
            created_at: Utc.timestamp_millis_opt(0).single().expect("epoch"),
            status: PostStatus::Draft,
        };
        let value = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(value["type"], "emagazine");
        assert_eq!(value["emagPage"], "https://page");
        assert_eq!(value["status"], "draft");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn error_body_prefers_error_field() {
        let body = ErrorBody::from_bytes(br#"{"error":"Unauthorized"}"#);
        assert_eq!(body.message().as_deref(), Some("Unauthorized"));

        let text = ErrorBody::from_bytes(b"<html>bad gateway</html>");
        assert_eq!(text, ErrorBody::Text("<html>bad gateway</html>".into()));

        assert_eq!(ErrorBody::from_bytes(b"  "), ErrorBody::Empty);
        assert_eq!(ErrorBody::Empty.message(), None);
    }
}
