//! Sequential application of one mutation to many posts.

use std::fmt;

use serde::Serialize;

use crate::client::{ApiError, PostGateway};

/// Mutation applied by a bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperation {
    /// `DELETE /posts/:id`.
    Delete,
    /// `PATCH /posts/:id/publish`.
    Publish,
    /// `PATCH /posts/:id/unpublish`.
    Unpublish,
}

impl BulkOperation {
    /// Past-tense verb used in summaries.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::Publish => "published",
            Self::Unpublish => "unpublished",
        }
    }

    /// Confirmation question for a single post.
    #[must_use]
    pub fn single_prompt(self, id: &str) -> String {
        match self {
            Self::Delete => format!("Delete post {id}?"),
            Self::Publish => format!("Publish post {id}?"),
            Self::Unpublish => format!("Unpublish post {id}?"),
        }
    }

    /// Confirmation question for several posts.
    #[must_use]
    pub fn bulk_prompt(self, count: usize) -> String {
        match self {
            Self::Delete => format!("Delete {count} posts?"),
            Self::Publish => format!("Publish {count} posts?"),
            Self::Unpublish => format!("Unpublish {count} posts?"),
        }
    }

    /// Issue the mutation for one id.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure unchanged.
    pub async fn apply<G>(self, gateway: &G, id: &str) -> Result<(), ApiError>
    where
        G: PostGateway + ?Sized,
    {
        match self {
            Self::Delete => gateway.delete(id).await,
            Self::Publish => gateway.publish(id).await,
            Self::Unpublish => gateway.unpublish(id).await,
        }
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Delete => "delete",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
        })
    }
}

/// Bulk action refused before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulkError {
    /// No ids were selected.
    #[error("no posts selected")]
    EmptySelection,
}

/// Result for one id of a bulk action.
#[derive(Debug)]
pub struct BulkItem {
    /// Post identifier.
    pub id: String,
    /// Outcome of the request for this id.
    pub result: Result<(), ApiError>,
}

impl BulkItem {
    /// Whether the request for this id succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered per-id results of a bulk action.
#[derive(Debug)]
pub struct BulkOutcome {
    /// Mutation that was applied.
    pub operation: BulkOperation,
    /// One entry per attempted id, in request order.
    pub items: Vec<BulkItem>,
}

impl BulkOutcome {
    /// Ids whose request succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(|item| item.is_ok())
            .map(|item| item.id.as_str())
    }

    /// Ids whose request failed, with the failure.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &ApiError)> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().err().map(|err| (item.id.as_str(), err)))
    }

    /// Whether every request succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.items.iter().all(BulkItem::is_ok)
    }

    /// One-line summary such as `3 of 5 posts published`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} of {} posts {}",
            self.succeeded().count(),
            self.items.len(),
            self.operation.verb()
        )
    }
}

/// `ids` without repeats, each kept at its first position.
#[must_use]
pub fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }
    unique
}

/// Apply `operation` to each id in order, one request at a time.
///
/// Duplicate ids are attempted once, at their first position. A failing id
/// does not stop the batch.
///
/// # Errors
///
/// Returns [`BulkError::EmptySelection`] without sending anything when `ids`
/// is empty.
pub async fn run_bulk<G>(
    gateway: &G,
    operation: BulkOperation,
    ids: &[String],
) -> Result<BulkOutcome, BulkError>
where
    G: PostGateway + ?Sized,
{
    if ids.is_empty() {
        return Err(BulkError::EmptySelection);
    }

    let mut items: Vec<BulkItem> = Vec::with_capacity(ids.len());
    for id in unique_ids(ids) {
        let result = operation.apply(gateway, &id).await;
        if let Err(err) = &result {
            tracing::warn!(%operation, id = %id, error = %err, "bulk item failed");
        }
        items.push(BulkItem { id, result });
    }

    let outcome = BulkOutcome { operation, items };
    tracing::info!(%operation, summary = %outcome.summary(), "bulk action finished");
    Ok(outcome)
}
