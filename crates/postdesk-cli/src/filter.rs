//! Pure narrowing of the cached collection by author, tag and category.

use postdesk_models::Post;

/// Filter predicate; every empty term matches all posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Case-insensitive substring of `author`.
    pub author: Option<String>,
    /// Case-insensitive substring of the raw `tags` string.
    pub tag: Option<String>,
    /// Exact category membership.
    pub category: Option<String>,
}

impl PostFilter {
    /// Whether the predicate matches every post.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        folded_term(self.author.as_deref()).is_none()
            && folded_term(self.tag.as_deref()).is_none()
            && exact_term(self.category.as_deref()).is_none()
    }

    /// Conjunctive match over all active terms.
    ///
    /// A malformed category never satisfies an active category term.
    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        let author_ok = folded_term(self.author.as_deref())
            .is_none_or(|term| post.author.to_lowercase().contains(&term));
        let tag_ok = folded_term(self.tag.as_deref())
            .is_none_or(|term| post.tags.to_lowercase().contains(&term));
        let category_ok =
            exact_term(self.category.as_deref()).is_none_or(|term| post.category.contains(term));
        author_ok && tag_ok && category_ok
    }
}

/// Matching posts in their original order. The input is left untouched.
#[must_use]
pub fn apply(posts: &[Post], filter: &PostFilter) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| filter.matches(post))
        .cloned()
        .collect()
}

fn folded_term(raw: Option<&str>) -> Option<String> {
    exact_term(raw).map(str::to_lowercase)
}

fn exact_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|term| !term.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postdesk_models::Category;
    use serde_json::json;

    fn post(id: &str, author: &str, tags: &str, category: Category) -> Post {
        let mut post: Post = serde_json::from_value(json!({ "_id": id })).expect("post");
        post.author = author.into();
        post.tags = tags.into();
        post.category = category;
        post
    }

    fn list(items: &[&str]) -> Category {
        Category::List(items.iter().map(|item| (*item).to_string()).collect())
    }

    fn corpus() -> Vec<Post> {
        vec![
            post("1", "Nguyen Lan", "#HaLong #bien", list(&["travel", "food"])),
            post("2", "Tran Minh", "#pho", list(&["food"])),
            post("3", "lan anh", "#halong", list(&["travel"])),
            post("4", "Lan", "#halong", Category::Malformed(json!("travel"))),
        ]
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.id.as_str()).collect()
    }

    #[test]
    fn empty_predicate_is_identity() {
        let posts = corpus();
        let filter = PostFilter {
            author: Some("   ".into()),
            tag: Some(String::new()),
            category: None,
        };
        assert!(filter.is_empty());
        assert_eq!(apply(&posts, &filter), posts);
        assert_eq!(apply(&posts, &PostFilter::default()), posts);
    }

    #[test]
    fn author_and_tag_are_case_insensitive_substrings() {
        let posts = corpus();
        let filter = PostFilter {
            author: Some(" LAN ".into()),
            tag: Some("halong".into()),
            category: None,
        };
        assert_eq!(ids(&apply(&posts, &filter)), ["1", "3", "4"]);
    }

    #[test]
    fn malformed_category_fails_closed_only_when_filtering() {
        let posts = corpus();
        let by_category = PostFilter {
            category: Some("travel".into()),
            ..PostFilter::default()
        };
        assert_eq!(ids(&apply(&posts, &by_category)), ["1", "3"]);

        let by_author = PostFilter {
            author: Some("lan".into()),
            ..PostFilter::default()
        };
        assert!(ids(&apply(&posts, &by_author)).contains(&"4"));
    }

    #[test]
    fn category_is_exact_membership() {
        let posts = corpus();
        let filter = PostFilter {
            category: Some("Food".into()),
            ..PostFilter::default()
        };
        assert!(apply(&posts, &filter).is_empty());
    }

    #[test]
    fn terms_compose_in_any_order() {
        let posts = corpus();
        let author = PostFilter {
            author: Some("lan".into()),
            ..PostFilter::default()
        };
        let tag = PostFilter {
            tag: Some("#halong".into()),
            ..PostFilter::default()
        };
        let category = PostFilter {
            category: Some("travel".into()),
            ..PostFilter::default()
        };
        let combined = PostFilter {
            author: author.author.clone(),
            tag: tag.tag.clone(),
            category: category.category.clone(),
        };
        let expected = apply(&posts, &combined);
        assert_eq!(ids(&expected), ["1", "3"]);

        let orders = [
            [&author, &tag, &category],
            [&author, &category, &tag],
            [&tag, &author, &category],
            [&tag, &category, &author],
            [&category, &author, &tag],
            [&category, &tag, &author],
        ];
        for order in orders {
            let narrowed = order
                .iter()
                .fold(posts.clone(), |acc, filter| apply(&acc, filter));
            assert_eq!(narrowed, expected);
        }
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let posts = corpus();
        let snapshot = posts.clone();
        let _ = apply(
            &posts,
            &PostFilter {
                author: Some("minh".into()),
                ..PostFilter::default()
            },
        );
        assert_eq!(posts, snapshot);
    }
}
