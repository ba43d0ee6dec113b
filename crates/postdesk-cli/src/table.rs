//! Generic resource table parametrised by status filter, columns and actions.
//!
//! The dashboard and the draft workspace are two instances of the same table;
//! only their [`TableProfile`] differs.

use postdesk_models::PostStatus;
use serde::Serialize;

/// Per-row affordance offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    /// Open the detail view.
    View,
    /// Open the draft editor.
    Edit,
    /// Move a draft to published.
    Publish,
    /// Move a published post back to draft.
    Unpublish,
    /// Remove the post permanently.
    Delete,
}

impl RowAction {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Delete => "delete",
        }
    }
}

/// Column shown by a table instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Post identifier (stands in for the selection checkbox).
    Id,
    /// Headline.
    Title,
    /// Byline.
    Author,
    /// Comma-joined categories.
    Category,
    /// Status badge.
    Status,
    /// Formatted creation time.
    CreatedAt,
    /// Available actions.
    Actions,
}

impl Column {
    /// Header label.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Title => "TITLE",
            Self::Author => "AUTHOR",
            Self::Category => "CATEGORY",
            Self::Status => "STATUS",
            Self::CreatedAt => "CREATED",
            Self::Actions => "ACTIONS",
        }
    }
}

const DASHBOARD_COLUMNS: &[Column] = &[
    Column::Id,
    Column::Title,
    Column::Author,
    Column::Category,
    Column::Status,
    Column::CreatedAt,
    Column::Actions,
];

const DRAFT_COLUMNS: &[Column] = &[
    Column::Id,
    Column::Title,
    Column::Author,
    Column::Category,
    Column::CreatedAt,
    Column::Actions,
];

const REVIEW_DRAFT: &[RowAction] = &[RowAction::View, RowAction::Publish, RowAction::Delete];
const EDIT_DRAFT: &[RowAction] = &[RowAction::Edit, RowAction::Publish, RowAction::Delete];
const REVIEW_PUBLISHED: &[RowAction] =
    &[RowAction::View, RowAction::Unpublish, RowAction::Delete];

/// Parameters turning the generic table into a concrete screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableProfile {
    /// Screen name used in logs.
    pub name: &'static str,
    /// Status passed to `list` when refreshing.
    pub status_filter: Option<PostStatus>,
    /// Visible columns in order.
    pub columns: &'static [Column],
    draft_actions: &'static [RowAction],
    published_actions: &'static [RowAction],
}

impl TableProfile {
    /// All posts, reviewed from the dashboard.
    #[must_use]
    pub const fn dashboard() -> Self {
        Self {
            name: "dashboard",
            status_filter: None,
            columns: DASHBOARD_COLUMNS,
            draft_actions: REVIEW_DRAFT,
            published_actions: REVIEW_PUBLISHED,
        }
    }

    /// Drafts only, edited from the draft workspace.
    #[must_use]
    pub const fn drafts() -> Self {
        Self {
            name: "drafts",
            status_filter: Some(PostStatus::Draft),
            columns: DRAFT_COLUMNS,
            draft_actions: EDIT_DRAFT,
            published_actions: REVIEW_PUBLISHED,
        }
    }

    /// Actions offered for a post in the given state.
    #[must_use]
    pub const fn actions_for(&self, status: PostStatus) -> &'static [RowAction] {
        match status {
            PostStatus::Draft => self.draft_actions,
            PostStatus::Published => self.published_actions,
        }
    }

    /// Whether the profile shows a column.
    #[must_use]
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_actions_follow_status() {
        let profile = TableProfile::dashboard();
        let draft = profile.actions_for(PostStatus::Draft);
        assert!(draft.contains(&RowAction::Publish));
        assert!(!draft.contains(&RowAction::Unpublish));

        let published = profile.actions_for(PostStatus::Published);
        assert!(published.contains(&RowAction::Unpublish));
        assert!(!published.contains(&RowAction::Publish));
    }

    #[test]
    fn draft_workspace_edits_instead_of_viewing() {
        let profile = TableProfile::drafts();
        assert_eq!(profile.status_filter, Some(PostStatus::Draft));
        assert_eq!(
            profile.actions_for(PostStatus::Draft),
            &[RowAction::Edit, RowAction::Publish, RowAction::Delete]
        );
        assert!(!profile.has_column(Column::Status));
        assert!(TableProfile::dashboard().has_column(Column::Status));
    }
}
