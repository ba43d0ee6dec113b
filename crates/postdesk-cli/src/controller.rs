//! Screen state for the admin surfaces and the actions they expose.
//!
//! [`AdminController`] owns everything one screen needs: the gateway, the
//! cached snapshot, the active filter, the row selection and the table
//! profile. Mutations follow the same shape everywhere: confirmation gate,
//! request, then a single refresh of the snapshot.

use std::io::{self, BufRead, Write};

use chrono::Utc;
use postdesk_models::{Post, PostStatus, PostUpdate};

use crate::bulk::{BulkError, BulkOperation, BulkOutcome, run_bulk, unique_ids};
use crate::cache::PostCache;
use crate::client::{ApiError, PostGateway};
use crate::composer::{ComposeError, ComposeInput, ContentScanner};
use crate::filter::{self, PostFilter};
use crate::render::{self, DetailView, DisplayRow, Locale, PostStats};
use crate::selection::Selection;
use crate::table::TableProfile;

/// Yes/no gate in front of destructive actions.
pub trait Confirm {
    /// Ask the user; `true` means proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Interactive `y/N` prompt on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{prompt} [y/N] ")
            .and_then(|()| stderr.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_affirmative(&answer)
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "c" | "co" | "có"
    )
}

/// Result of an action that may be declined.
#[derive(Debug)]
pub enum ActionOutcome<T> {
    /// The user declined; nothing was sent.
    Cancelled,
    /// The action ran.
    Completed {
        /// Action result.
        value: T,
        /// Failure of the follow-up refresh, if any. The stale snapshot is kept.
        refresh: Option<ApiError>,
    },
}

impl<T> ActionOutcome<T> {
    /// Whether the user declined.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised by controller actions.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Bulk action refused.
    #[error(transparent)]
    Bulk(#[from] BulkError),
    /// The id is not part of the current snapshot.
    #[error("post '{id}' not found")]
    UnknownPost {
        /// Requested identifier.
        id: String,
    },
    /// Only drafts can be edited.
    #[error("post '{id}' is published; unpublish it before editing")]
    NotDraft {
        /// Requested identifier.
        id: String,
    },
    /// Composer input rejected.
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl ActionError {
    /// Whether the failure was caused by user input rather than the system.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Api(err) => err.is_validation(),
            Self::Bulk(_) | Self::UnknownPost { .. } | Self::NotDraft { .. } => true,
            Self::Compose(err) => matches!(err, ComposeError::Missing(_)),
        }
    }
}

/// State and actions of one admin screen.
#[derive(Debug)]
pub struct AdminController<G> {
    gateway: G,
    cache: PostCache,
    filter: PostFilter,
    selection: Selection,
    profile: TableProfile,
    locale: Locale,
}

impl<G> AdminController<G>
where
    G: PostGateway,
{
    /// Controller over an empty snapshot.
    #[must_use]
    pub fn new(gateway: G, profile: TableProfile, locale: Locale) -> Self {
        Self {
            gateway,
            cache: PostCache::default(),
            filter: PostFilter::default(),
            selection: Selection::new(),
            profile,
            locale,
        }
    }

    /// Gateway used for requests.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Active table profile.
    pub const fn profile(&self) -> &TableProfile {
        &self.profile
    }

    /// Cached snapshot.
    pub const fn cache(&self) -> &PostCache {
        &self.cache
    }

    /// Fetch the collection for this screen.
    ///
    /// # Errors
    ///
    /// Returns the client error; the previous snapshot is kept.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.cache
            .refresh(&self.gateway, self.profile.status_filter)
            .await?;
        self.selection.clear();
        tracing::debug!(
            screen = self.profile.name,
            posts = self.cache.current().len(),
            "snapshot refreshed"
        );
        Ok(())
    }

    /// Replace the active filter. Clears the selection.
    pub fn set_filter(&mut self, filter: PostFilter) {
        self.filter = filter;
        self.selection.clear();
    }

    /// Drop the active filter. Clears the selection.
    pub fn clear_filter(&mut self) {
        self.set_filter(PostFilter::default());
    }

    /// Active filter.
    pub const fn filter(&self) -> &PostFilter {
        &self.filter
    }

    /// Cached posts that pass the active filter, in server order.
    #[must_use]
    pub fn visible(&self) -> Vec<Post> {
        filter::apply(self.cache.current(), &self.filter)
    }

    /// Render the visible posts with the current selection marked.
    #[must_use]
    pub fn rows(&self) -> Vec<DisplayRow> {
        let mut rows = render::render(&self.visible(), &self.profile, self.locale);
        for row in &mut rows {
            row.selected = self.selection.contains(&row.id);
        }
        rows
    }

    /// Fresh render of the visible posts. Clears the selection.
    pub fn render_rows(&mut self) -> Vec<DisplayRow> {
        self.selection.clear();
        render::render(&self.visible(), &self.profile, self.locale)
    }

    /// Toggle one row's checkbox.
    pub fn toggle(&mut self, id: &str) {
        self.selection.toggle(id);
    }

    /// Select every visible row, or clear when all are already selected.
    pub fn select_all(&mut self) {
        let visible = self.visible();
        self.selection
            .select_all_or_clear(visible.iter().map(|post| post.id.as_str()));
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids().to_vec()
    }

    /// Fetch one post and build its detail view.
    ///
    /// # Errors
    ///
    /// Returns the client error.
    pub async fn view(&self, id: &str) -> Result<DetailView, ApiError> {
        let post = self.gateway.get(id).await?;
        Ok(render::render_detail(&post, self.locale))
    }

    /// Delete one post after confirmation.
    ///
    /// # Errors
    ///
    /// Returns the client error of the mutation; no refresh happens then.
    pub async fn delete(
        &mut self,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome<()>, ActionError> {
        self.single(BulkOperation::Delete, id, confirm).await
    }

    /// Publish one post after confirmation.
    ///
    /// # Errors
    ///
    /// Returns the client error of the mutation; no refresh happens then.
    pub async fn publish(
        &mut self,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome<()>, ActionError> {
        self.single(BulkOperation::Publish, id, confirm).await
    }

    /// Unpublish one post after confirmation.
    ///
    /// # Errors
    ///
    /// Returns the client error of the mutation; no refresh happens then.
    pub async fn unpublish(
        &mut self,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome<()>, ActionError> {
        self.single(BulkOperation::Unpublish, id, confirm).await
    }

    async fn single(
        &mut self,
        operation: BulkOperation,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome<()>, ActionError> {
        if !confirm.confirm(&operation.single_prompt(id)) {
            tracing::debug!(%operation, id, "action cancelled");
            return Ok(ActionOutcome::Cancelled);
        }
        operation.apply(&self.gateway, id).await?;
        tracing::info!(%operation, id, "post updated");
        Ok(self.completed(()).await)
    }

    /// Apply one operation to several posts, then refresh once.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::EmptySelection`] when `ids` is empty. Per-id
    /// failures are reported inside the outcome.
    pub async fn bulk(
        &mut self,
        operation: BulkOperation,
        ids: &[String],
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome<BulkOutcome>, ActionError> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Err(BulkError::EmptySelection.into());
        }
        if !confirm.confirm(&operation.bulk_prompt(ids.len())) {
            tracing::debug!(%operation, count = ids.len(), "bulk action cancelled");
            return Ok(ActionOutcome::Cancelled);
        }
        let outcome = run_bulk(&self.gateway, operation, &ids).await?;
        Ok(self.completed(outcome).await)
    }

    /// Replace the editable fields of a cached draft.
    ///
    /// The update starts from the cached values; `change` overrides them.
    /// When the server does not echo the post, the refreshed snapshot entry
    /// is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownPost`] or [`ActionError::NotDraft`]
    /// without sending anything, or the client error of the update.
    pub async fn edit<F>(
        &mut self,
        id: &str,
        change: F,
    ) -> Result<ActionOutcome<Option<Post>>, ActionError>
    where
        F: FnOnce(&mut PostUpdate),
    {
        let post = self
            .cache
            .find(id)
            .ok_or_else(|| ActionError::UnknownPost { id: id.to_string() })?;
        if post.status != PostStatus::Draft {
            return Err(ActionError::NotDraft { id: id.to_string() });
        }
        let mut update = PostUpdate::from(post);
        change(&mut update);
        let echoed = self.gateway.update(id, &update).await?;
        tracing::info!(id, echoed = echoed.is_some(), "draft updated");
        let refresh = self.load().await.err();
        let value = echoed.or_else(|| self.cache.find(id).cloned());
        Ok(ActionOutcome::Completed { value, refresh })
    }

    /// Validate composer input and create a draft.
    ///
    /// The created post is `None` when the server does not echo it.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Compose`] for missing fields, or the client
    /// error of the create request.
    pub async fn compose(
        &mut self,
        input: &ComposeInput,
    ) -> Result<ActionOutcome<Option<Post>>, ActionError> {
        let scanner = ContentScanner::new()?;
        let draft = input
            .validate(&scanner, Utc::now())
            .map_err(ComposeError::from)?;
        let created = self.gateway.create(&draft).await?;
        tracing::info!(
            id = created.as_ref().map_or("", |post| post.id.as_str()),
            "draft created"
        );
        Ok(self.completed(created).await)
    }

    /// Counts over the unfiltered snapshot.
    #[must_use]
    pub fn stats(&self) -> PostStats {
        render::stats(self.cache.current())
    }

    async fn completed<T>(&mut self, value: T) -> ActionOutcome<T> {
        let refresh = self.load().await.err();
        ActionOutcome::Completed { value, refresh }
    }
}
