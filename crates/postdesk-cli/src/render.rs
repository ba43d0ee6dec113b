//! Deterministic projection of posts into display rows and detail views.
//!
//! Every user-supplied text field is HTML-escaped before it lands in a row so
//! the output can be embedded in markup without opening an injection vector.
//! Rows are ordered newest first regardless of the order the server used.

use chrono::{DateTime, Local, TimeZone, Utc};
use postdesk_models::{Post, PostBody, PostStatus};
use serde::Serialize;

use crate::table::{RowAction, TableProfile};

/// Placeholder shown when a post has no usable timestamp.
pub const MISSING_TIMESTAMP: &str = "–";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Language of status labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Locale {
    /// Vietnamese.
    #[default]
    Vi,
    /// English.
    En,
}

impl Locale {
    /// Label for a publication state.
    #[must_use]
    pub const fn status_label(self, status: PostStatus) -> &'static str {
        match (self, status) {
            (Self::Vi, PostStatus::Draft) => "Chờ duyệt",
            (Self::Vi, PostStatus::Published) => "Đã đăng",
            (Self::En, PostStatus::Draft) => "Draft",
            (Self::En, PostStatus::Published) => "Published",
        }
    }
}

/// Status badge carried by a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// Underlying state.
    pub status: PostStatus,
    /// Localised label.
    pub label: &'static str,
}

impl StatusBadge {
    fn new(status: PostStatus, locale: Locale) -> Self {
        Self {
            status,
            label: locale.status_label(status),
        }
    }
}

/// Display-ready row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    /// Post identifier.
    pub id: String,
    /// Selection checkbox state; always `false` on a fresh render.
    pub selected: bool,
    /// Escaped headline.
    pub title: String,
    /// Escaped byline.
    pub author: String,
    /// Escaped, comma-joined categories.
    pub category: String,
    /// Status badge.
    pub status: StatusBadge,
    /// Local creation time.
    pub created_at: String,
    /// Actions offered for the row.
    pub actions: Vec<RowAction>,
}

/// Render posts for a table profile, newest first.
#[must_use]
pub fn render(posts: &[Post], profile: &TableProfile, locale: Locale) -> Vec<DisplayRow> {
    let mut ordered: Vec<&Post> = posts.iter().collect();
    ordered.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    ordered
        .into_iter()
        .map(|post| DisplayRow {
            id: post.id.clone(),
            selected: false,
            title: escape_html(&post.title),
            author: escape_html(&post.author),
            category: escape_html(&post.category.joined()),
            status: StatusBadge::new(post.status, locale),
            created_at: format_timestamp(post.created_at),
            actions: profile.actions_for(post.status).to_vec(),
        })
        .collect()
}

/// Escape `& < > " '` for safe insertion into markup.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Format a timestamp in the local time zone.
#[must_use]
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    format_timestamp_in(timestamp, &Local)
}

/// Format a timestamp in an explicit time zone.
#[must_use]
pub fn format_timestamp_in<Tz>(timestamp: Option<DateTime<Utc>>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp.map_or_else(
        || MISSING_TIMESTAMP.to_string(),
        |value| {
            value
                .with_timezone(zone)
                .format(TIMESTAMP_FORMAT)
                .to_string()
        },
    )
}

/// Body of the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailBody {
    /// Emagazine page embedded as a frame.
    Frame {
        /// Escaped page URL.
        src: String,
        /// Ready-to-insert `<iframe>` markup.
        html: String,
    },
    /// Rich content produced by the editor.
    Html {
        /// Stored HTML.
        html: String,
    },
    /// Emagazine post without a page reference.
    Missing,
}

/// Detail view of a single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailView {
    /// Post identifier.
    pub id: String,
    /// Escaped headline.
    pub title: String,
    /// Escaped byline.
    pub author: String,
    /// Escaped summary.
    pub sapo: String,
    /// Status badge.
    pub status: StatusBadge,
    /// Local creation time.
    pub created_at: String,
    /// Effective body.
    pub body: DetailBody,
}

/// Build the detail view. Emagazine posts with a page always embed the page.
#[must_use]
pub fn render_detail(post: &Post, locale: Locale) -> DetailView {
    let body = match post.body() {
        PostBody::External(page) => {
            let src = escape_html(page);
            let html = format!(
                "<iframe src=\"{src}\" style=\"width:100%; height:80vh; border:none; border-radius:12px;\" allowfullscreen></iframe>"
            );
            DetailBody::Frame { src, html }
        }
        PostBody::Html(content) => DetailBody::Html {
            html: content.to_string(),
        },
        PostBody::Missing => DetailBody::Missing,
    };
    DetailView {
        id: post.id.clone(),
        title: escape_html(&post.title),
        author: escape_html(&post.author),
        sapo: escape_html(&post.sapo),
        status: StatusBadge::new(post.status, locale),
        created_at: format_timestamp(post.created_at),
        body,
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostStats {
    /// All posts.
    pub total: usize,
    /// Posts awaiting review.
    pub drafts: usize,
    /// Published posts.
    pub published: usize,
}

/// Count posts by status.
#[must_use]
pub fn stats(posts: &[Post]) -> PostStats {
    posts.iter().fold(
        PostStats {
            total: posts.len(),
            ..PostStats::default()
        },
        |mut acc, post| {
            match post.status {
                PostStatus::Draft => acc.drafts += 1,
                PostStatus::Published => acc.published += 1,
            }
            acc
        },
    )
}
