//! Draft composition: required-field checks, body selection and editor helpers.

use std::fmt;

use chrono::{DateTime, Utc};
use postdesk_models::{PostDraft, PostKind, PostStatus};
use regex::Regex;
use serde::Serialize;
use url::Url;

/// Category that switches a post to an externally hosted page.
pub const EMAGAZINE_CATEGORY: &str = "emagazine";

/// Editor placeholder text that counts as no content.
const EMPTY_PLACEHOLDER: &str = "(Trống)";

const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed/";

/// Field the composer requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ComposeField {
    /// External page link for emagazine posts.
    EmagPage,
    /// Rich content for normal posts.
    Content,
    /// Headline.
    Title,
    /// Summary.
    Sapo,
    /// At least one category.
    Category,
    /// Thumbnail URL.
    Thumbnail,
    /// Hashtags.
    Tags,
}

impl ComposeField {
    /// Name shown to the user.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmagPage => "emag page",
            Self::Content => "content",
            Self::Title => "title",
            Self::Sapo => "sapo",
            Self::Category => "category",
            Self::Thumbnail => "thumbnail",
            Self::Tags => "tags",
        }
    }
}

/// Every required field that was left empty, in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", self.labels().join(", "))]
pub struct MissingFields(pub Vec<ComposeField>);

impl MissingFields {
    /// Labels of the missing fields.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.0.iter().map(|field| field.label()).collect()
    }
}

/// Errors raised while composing a post.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Required fields are empty.
    #[error(transparent)]
    Missing(#[from] MissingFields),
    /// A content pattern failed to compile.
    #[error("failed to compile content pattern '{pattern}'")]
    Pattern {
        /// Pattern that failed.
        pattern: &'static str,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Raw composer input as typed by the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeInput {
    /// Headline.
    pub title: String,
    /// Summary.
    pub sapo: String,
    /// Byline; optional.
    pub author: String,
    /// Checked categories.
    pub categories: Vec<String>,
    /// Thumbnail URL.
    pub thumbnail: String,
    /// Hashtags.
    pub tags: String,
    /// Editor HTML.
    pub content: String,
    /// External page link.
    pub emag_page: String,
}

impl ComposeInput {
    /// Whether the categories select the emagazine body.
    #[must_use]
    pub fn is_emagazine(&self) -> bool {
        self.categories
            .iter()
            .any(|category| category.trim() == EMAGAZINE_CATEGORY)
    }

    /// Check required fields and build the draft sent to `POST /posts`.
    ///
    /// # Errors
    ///
    /// Returns every missing field at once.
    pub fn validate(
        &self,
        scanner: &ContentScanner,
        now: DateTime<Utc>,
    ) -> Result<PostDraft, MissingFields> {
        let title = self.title.trim();
        let sapo = self.sapo.trim();
        let thumbnail = self.thumbnail.trim();
        let tags = self.tags.trim();
        let emag_page = self.emag_page.trim();
        let categories: Vec<String> = self
            .categories
            .iter()
            .map(|category| category.trim())
            .filter(|category| !category.is_empty())
            .map(str::to_string)
            .collect();
        let emagazine = self.is_emagazine();

        let mut missing = Vec::new();
        if emagazine {
            if emag_page.is_empty() {
                missing.push(ComposeField::EmagPage);
            }
        } else {
            let text = scanner.plain_text(&self.content);
            let text = text.trim();
            if text.is_empty() || text == EMPTY_PLACEHOLDER {
                missing.push(ComposeField::Content);
            }
        }
        for (field, value) in [
            (ComposeField::Title, title),
            (ComposeField::Sapo, sapo),
        ] {
            if value.is_empty() {
                missing.push(field);
            }
        }
        if categories.is_empty() {
            missing.push(ComposeField::Category);
        }
        for (field, value) in [
            (ComposeField::Thumbnail, thumbnail),
            (ComposeField::Tags, tags),
        ] {
            if value.is_empty() {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(MissingFields(missing));
        }

        Ok(PostDraft {
            title: title.to_string(),
            sapo: sapo.to_string(),
            author: self.author.trim().to_string(),
            category: categories,
            tags: tags.to_string(),
            thumbnail: thumbnail.to_string(),
            kind: if emagazine {
                PostKind::Emagazine
            } else {
                PostKind::Normal
            },
            emag_page: if emagazine {
                emag_page.to_string()
            } else {
                String::new()
            },
            content: if emagazine {
                String::new()
            } else {
                self.content.clone()
            },
            created_at: now,
            status: PostStatus::Draft,
        })
    }
}

/// Counters shown in the editor status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    /// Whitespace-separated words of the plain text.
    pub words: usize,
    /// Characters of the plain text.
    pub chars: usize,
    /// `<img>` elements.
    pub images: usize,
    /// `<iframe>` elements.
    pub videos: usize,
}

/// Precompiled patterns for inspecting editor HTML.
#[derive(Debug, Clone)]
pub struct ContentScanner {
    tag: Regex,
    image: Regex,
    frame: Regex,
}

const TAG_PATTERN: &str = r"<[^>]*>";
const IMAGE_PATTERN: &str = r"(?i)<img\s";
const FRAME_PATTERN: &str = r"(?i)<iframe[\s>]";

impl ContentScanner {
    /// Compile the scanner patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Pattern`] when a pattern fails to compile.
    pub fn new() -> Result<Self, ComposeError> {
        let compile = |pattern: &'static str| {
            Regex::new(pattern).map_err(|source| ComposeError::Pattern { pattern, source })
        };
        Ok(Self {
            tag: compile(TAG_PATTERN)?,
            image: compile(IMAGE_PATTERN)?,
            frame: compile(FRAME_PATTERN)?,
        })
    }

    /// Text content of an HTML fragment with tags removed.
    #[must_use]
    pub fn plain_text(&self, html: &str) -> String {
        let stripped = self.tag.replace_all(html, " ");
        stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#039;", "'")
            .replace("&amp;", "&")
    }

    /// Word, character, image and video counts for an HTML fragment.
    #[must_use]
    pub fn content_stats(&self, html: &str) -> ContentStats {
        let text = self.plain_text(html);
        let text = text.split_whitespace().collect::<Vec<_>>();
        ContentStats {
            words: text.len(),
            chars: text.join(" ").chars().count(),
            images: self.image.find_iter(html).count(),
            videos: self.frame.find_iter(html).count(),
        }
    }
}

/// Rewrite a YouTube watch or short link into its embeddable form.
///
/// Inputs that are not YouTube links are returned unchanged.
#[must_use]
pub fn youtube_to_embed(link: &str) -> String {
    let Ok(url) = Url::parse(link.trim()) else {
        return link.to_string();
    };
    if url.host_str().is_some_and(|host| host.contains("youtu.be")) {
        let id = url.path().trim_start_matches('/');
        if !id.is_empty() {
            return format!("{YOUTUBE_EMBED}{id}");
        }
    }
    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v")
        && !id.is_empty()
    {
        return format!("{YOUTUBE_EMBED}{id}");
    }
    link.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> ContentScanner {
        ContentScanner::new().expect("patterns compile")
    }

    fn complete() -> ComposeInput {
        ComposeInput {
            title: " Ha Long ".into(),
            sapo: "Bay trip".into(),
            author: String::new(),
            categories: vec!["travel".into()],
            thumbnail: "https://img.example/1.jpg".into(),
            tags: "#halong".into(),
            content: "<p>Hello <b>bay</b></p>".into(),
            emag_page: "https://ignored.example".into(),
        }
    }

    #[test]
    fn normal_post_keeps_content_and_drops_page() {
        let now = Utc::now();
        let draft = complete().validate(&scanner(), now).expect("valid");
        assert_eq!(draft.title, "Ha Long");
        assert_eq!(draft.kind, PostKind::Normal);
        assert_eq!(draft.emag_page, "");
        assert_eq!(draft.content, "<p>Hello <b>bay</b></p>");
        assert_eq!(draft.status, PostStatus::Draft);
        assert_eq!(draft.created_at, now);
    }

    #[test]
    fn emagazine_requires_page_and_drops_content() {
        let mut input = complete();
        input.categories = vec!["emagazine".into(), "travel".into()];
        input.emag_page = " https://mag.example/1 ".into();
        let draft = input.validate(&scanner(), Utc::now()).expect("valid");
        assert_eq!(draft.kind, PostKind::Emagazine);
        assert_eq!(draft.emag_page, "https://mag.example/1");
        assert_eq!(draft.content, "");

        input.emag_page.clear();
        input.content.clear();
        let missing = input
            .validate(&scanner(), Utc::now())
            .expect_err("page missing");
        assert_eq!(missing.0, [ComposeField::EmagPage]);
    }

    #[test]
    fn all_missing_fields_are_reported_in_order() {
        let input = ComposeInput {
            content: "<p>(Trống)</p>".into(),
            ..ComposeInput::default()
        };
        let missing = input
            .validate(&scanner(), Utc::now())
            .expect_err("everything missing");
        assert_eq!(
            missing.0,
            [
                ComposeField::Content,
                ComposeField::Title,
                ComposeField::Sapo,
                ComposeField::Category,
                ComposeField::Thumbnail,
                ComposeField::Tags,
            ]
        );
        assert_eq!(
            missing.to_string(),
            "missing required fields: content, title, sapo, category, thumbnail, tags"
        );
    }

    #[test]
    fn markup_without_text_counts_as_empty() {
        let mut input = complete();
        input.content = "<p><br></p>".into();
        let missing = input.validate(&scanner(), Utc::now()).expect_err("empty");
        assert_eq!(missing.0, [ComposeField::Content]);
    }

    #[test]
    fn content_stats_counts_media() {
        let html = r#"<p>Two words</p><img src="a.png"><IMG src="b.png"><iframe src="https://www.youtube.com/embed/x"></iframe>"#;
        let stats = scanner().content_stats(html);
        assert_eq!(
            stats,
            ContentStats {
                words: 2,
                chars: 9,
                images: 2,
                videos: 1
            }
        );
        assert_eq!(scanner().content_stats(""), ContentStats::default());
    }

    #[test]
    fn youtube_links_become_embeds() {
        assert_eq!(
            youtube_to_embed("https://youtu.be/abc123"),
            "https://www.youtube.com/embed/abc123"
        );
        assert_eq!(
            youtube_to_embed("https://www.youtube.com/watch?v=xyz&t=10"),
            "https://www.youtube.com/embed/xyz"
        );
        assert_eq!(
            youtube_to_embed("https://vimeo.com/1"),
            "https://vimeo.com/1"
        );
        assert_eq!(youtube_to_embed("not a url"), "not a url");
    }
}
