//! Local snapshot of the last fetched post collection.
//!
//! The snapshot is only ever replaced wholesale by a successful `list` call.
//! A failed refresh leaves the previous snapshot in place so callers keep
//! showing stale rows instead of an empty table.

use postdesk_models::{Post, PostStatus};

use crate::client::{ApiResult, PostGateway};

/// Ordered snapshot of posts as received from the server.
#[derive(Debug, Clone, Default)]
pub struct PostCache {
    posts: Vec<Post>,
    generation: u64,
}

impl PostCache {
    /// Replace the snapshot with a fresh `list` result.
    ///
    /// # Errors
    ///
    /// Returns the client error unchanged; the previous snapshot is retained.
    pub async fn refresh<G>(&mut self, gateway: &G, status: Option<PostStatus>) -> ApiResult<()>
    where
        G: PostGateway + ?Sized,
    {
        match gateway.list(status).await {
            Ok(posts) => {
                self.posts = posts;
                self.generation += 1;
                tracing::info!(
                    count = self.posts.len(),
                    generation = self.generation,
                    "post list refreshed"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed; keeping previous snapshot");
                Err(err)
            }
        }
    }

    /// Latest snapshot in server order.
    #[must_use]
    pub fn current(&self) -> &[Post] {
        &self.posts
    }

    /// Look up a cached post by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    /// Number of successful refreshes so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResourceClient;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ResourceClient {
        ResourceClient::with_client(
            Client::new(),
            server.base_url().parse().expect("valid URL"),
            Some("t".into()),
        )
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_in_server_order() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/posts");
            then.status(200).json_body(json!([
                { "_id": "b", "createdAt": "2024-01-01T00:00:00Z" },
                { "_id": "a", "createdAt": "2024-06-01T00:00:00Z" }
            ]));
        });

        let mut cache = PostCache::default();
        cache
            .refresh(&client_for(&server), None)
            .await
            .expect("refresh");
        let ids: Vec<_> = cache.current().iter().map(|post| post.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(cache.generation(), 1);
        assert!(cache.find("a").is_some());
        assert!(cache.find("zzz").is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_snapshot() {
        let server = MockServer::start_async().await;
        let mut ok = server.mock(|when, then| {
            when.method(GET).path("/posts");
            then.status(200).json_body(json!([{ "_id": "a" }]));
        });

        let client = client_for(&server);
        let mut cache = PostCache::default();
        cache.refresh(&client, None).await.expect("first refresh");
        ok.delete();

        server.mock(|when, then| {
            when.method(GET).path("/posts");
            then.status(500).body("boom");
        });
        let err = cache.refresh(&client, None).await.expect_err("second refresh fails");
        assert_eq!(err.status().map(|status| status.as_u16()), Some(500));
        assert_eq!(cache.current().len(), 1);
        assert_eq!(cache.generation(), 1);
    }
}
