//! Typed HTTP client for the `/posts` resource and its error taxonomy.
//!
//! The client keeps no state between calls beyond its configuration and the
//! bearer credential it was built with. Every outcome is normalised into
//! [`ApiError`]: a transport fault, a non-success status, or a success status
//! whose body could not be decoded.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use postdesk_models::{
    ErrorBody, LoginRequest, LoginResponse, Post, PostDraft, PostStatus, PostUpdate,
    UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

/// Default per-request timeout applied by the CLI.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Result alias for resource client calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Uniform failure value for every request the client issues.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server or the response never arrived.
    #[error("request to {path} failed: {source}")]
    Network {
        /// Resource path that was requested.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{path} returned {status}{detail}", detail = detail_suffix(.body))]
    Rejected {
        /// Resource path that was requested.
        path: String,
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Parsed JSON body, or raw text when it was not JSON.
        body: ErrorBody,
    },
    /// The server answered with success but the body could not be decoded.
    #[error("{path} returned {status} with an unreadable body")]
    Parse {
        /// Resource path that was requested.
        path: String,
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Raw body as received.
        body: ErrorBody,
    },
    /// The configured base URL cannot carry path segments.
    #[error("base URL '{url}' cannot be used for API requests")]
    InvalidBaseUrl {
        /// Offending base URL.
        url: String,
    },
    /// The request could not be assembled before sending.
    #[error("failed to build request to {path}: {source}")]
    Build {
        /// Resource path that was being built.
        path: String,
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// HTTP status carried by the failure, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } | Self::Parse { status, .. } => Some(*status),
            Self::Network { .. } | Self::InvalidBaseUrl { .. } | Self::Build { .. } => None,
        }
    }

    /// Body carried by the failure, when a response was received.
    #[must_use]
    pub const fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Rejected { body, .. } | Self::Parse { body, .. } => Some(body),
            Self::Network { .. } | Self::InvalidBaseUrl { .. } | Self::Build { .. } => None,
        }
    }

    /// Whether the server refused the request for lack of a valid credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    /// Whether the server rejected the request content itself.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                status: StatusCode::BAD_REQUEST
                    | StatusCode::CONFLICT
                    | StatusCode::UNPROCESSABLE_ENTITY,
                ..
            }
        )
    }
}

fn detail_suffix(body: &ErrorBody) -> String {
    body.message()
        .filter(|message| !message.is_empty())
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

/// Operations on the remote post collection.
///
/// Implemented by [`ResourceClient`]; the controller and bulk coordinator only
/// depend on this seam.
#[async_trait]
pub trait PostGateway: Send + Sync {
    /// `GET /posts`, optionally narrowed by status.
    async fn list(&self, status: Option<PostStatus>) -> ApiResult<Vec<Post>>;
    /// `GET /posts/:id`.
    async fn get(&self, id: &str) -> ApiResult<Post>;
    /// `POST /posts`. `None` when the server answers without a body.
    async fn create(&self, draft: &PostDraft) -> ApiResult<Option<Post>>;
    /// `PUT /posts/:id`. `None` when the server answers without a body.
    async fn update(&self, id: &str, update: &PostUpdate) -> ApiResult<Option<Post>>;
    /// `DELETE /posts/:id`.
    async fn delete(&self, id: &str) -> ApiResult<()>;
    /// `PATCH /posts/:id/publish`.
    async fn publish(&self, id: &str) -> ApiResult<()>;
    /// `PATCH /posts/:id/unpublish`.
    async fn unpublish(&self, id: &str) -> ApiResult<()>;
}

/// HTTP implementation of [`PostGateway`] plus the auth and upload endpoints.
#[derive(Clone, Debug)]
pub struct ResourceClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

struct RawResponse {
    path: String,
    status: StatusCode,
    bytes: Vec<u8>,
}

impl ResourceClient {
    /// Build a client with a bounded per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Wrap an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client, base_url: Url, token: Option<String>) -> Self {
        Self {
            http,
            base_url,
            token: token.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Base URL every path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a bearer credential will be attached to authorised requests.
    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    /// `POST /auth/login`. Never carries a bearer credential.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, rejection, or an
    /// unreadable response.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let (builder, path) = self.request(Method::POST, &["auth", "login"], false)?;
        let raw = self.execute(builder.json(&request), path).await?;
        decode(raw)
    }

    /// `POST /upload` with the file as multipart field `image`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, rejection, or a response
    /// without a URL.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> ApiResult<UploadResponse> {
        let (builder, path) = self.request(Method::POST, &["upload"], false)?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))
            .map_err(|source| ApiError::Build {
                path: path.clone(),
                source,
            })?;
        let form = Form::new().part("image", part);
        let raw = self.execute(builder.multipart(form), path).await?;
        decode(raw)
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<(Url, String)> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        let path = format!("/{}", segments.join("/"));
        Ok((url, path))
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        authorized: bool,
    ) -> ApiResult<(RequestBuilder, String)> {
        let (url, path) = self.endpoint(segments)?;
        let mut builder = self.http.request(method, url);
        if authorized && let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok((builder, path))
    }

    async fn execute(&self, builder: RequestBuilder, path: String) -> ApiResult<RawResponse> {
        tracing::debug!(path = %path, credential = self.token.is_some(), "sending request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                tracing::warn!(path = %path, error = %source, "request failed");
                return Err(ApiError::Network { path, source });
            }
        };
        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(source) => return Err(ApiError::Network { path, source }),
        };
        if !status.is_success() {
            tracing::warn!(path = %path, status = status.as_u16(), "request rejected");
            return Err(ApiError::Rejected {
                path,
                status,
                body: ErrorBody::from_bytes(&bytes),
            });
        }
        tracing::debug!(path = %path, status = status.as_u16(), "request succeeded");
        Ok(RawResponse {
            path,
            status,
            bytes,
        })
    }

    async fn mutate(&self, method: Method, segments: &[&str]) -> ApiResult<()> {
        let (builder, path) = self.request(method, segments, true)?;
        self.execute(builder, path).await.map(|_| ())
    }
}

#[async_trait]
impl PostGateway for ResourceClient {
    async fn list(&self, status: Option<PostStatus>) -> ApiResult<Vec<Post>> {
        let (mut builder, path) = self.request(Method::GET, &["posts"], true)?;
        if let Some(status) = status {
            builder = builder.query(&[("status", status.as_str())]);
        }
        decode(self.execute(builder, path).await?)
    }

    async fn get(&self, id: &str) -> ApiResult<Post> {
        let (builder, path) = self.request(Method::GET, &["posts", id], true)?;
        decode(self.execute(builder, path).await?)
    }

    async fn create(&self, draft: &PostDraft) -> ApiResult<Option<Post>> {
        let mut draft = draft.clone();
        draft.status = PostStatus::Draft;
        let (builder, path) = self.request(Method::POST, &["posts"], true)?;
        decode_optional(self.execute(builder.json(&draft), path).await?)
    }

    async fn update(&self, id: &str, update: &PostUpdate) -> ApiResult<Option<Post>> {
        let (builder, path) = self.request(Method::PUT, &["posts", id], true)?;
        decode_optional(self.execute(builder.json(update), path).await?)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.mutate(Method::DELETE, &["posts", id]).await
    }

    async fn publish(&self, id: &str) -> ApiResult<()> {
        self.mutate(Method::PATCH, &["posts", id, "publish"]).await
    }

    async fn unpublish(&self, id: &str) -> ApiResult<()> {
        self.mutate(Method::PATCH, &["posts", id, "unpublish"]).await
    }
}

fn decode<T: DeserializeOwned>(raw: RawResponse) -> ApiResult<T> {
    let RawResponse {
        path,
        status,
        bytes,
    } = raw;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::Parse {
            path,
            status,
            body: ErrorBody::Empty,
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::warn!(path = %path, error = %err, "response body could not be decoded");
        ApiError::Parse {
            path,
            status,
            body: ErrorBody::from_bytes(&bytes),
        }
    })
}

/// Like [`decode`], but an empty success body is an absent value.
fn decode_optional<T: DeserializeOwned>(raw: RawResponse) -> ApiResult<Option<T>> {
    if raw.bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    decode(raw).map(Some)
}

fn image_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Parse the API URL provided to the CLI.
///
/// # Errors
///
/// Returns a message suitable for clap when the input is not an absolute URL.
pub fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::PATCH;
    use httpmock::prelude::*;
    use postdesk_models::PostKind;
    use serde_json::json;

    fn client_for(server: &MockServer, token: Option<&str>) -> ResourceClient {
        ResourceClient::with_client(
            Client::new(),
            server.base_url().parse().expect("valid URL"),
            token.map(str::to_string),
        )
    }

    fn sample_draft() -> PostDraft {
        PostDraft {
            title: "Ha Long".into(),
            sapo: "Bay trip".into(),
            author: "Lan".into(),
            category: vec!["travel".into()],
            tags: "#halong".into(),
            thumbnail: "https://img.example/1.jpg".into(),
            kind: PostKind::Normal,
            emag_page: String::new(),
            content: "<p>hello</p>".into(),
            created_at: chrono::Utc::now(),
            status: PostStatus::Published,
        }
    }

    #[test]
    fn parse_url_rejects_invalid_input() {
        let err = parse_url("not-a-url").expect_err("invalid URL should fail");
        assert!(err.contains("invalid URL"));
    }

    #[tokio::test]
    async fn list_sends_bearer_and_status_query() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/posts")
                .query_param("status", "draft")
                .header("authorization", "Bearer secret-token");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{ "_id": "a", "title": "First", "status": "draft" }]));
        });

        let client = client_for(&server, Some("secret-token"));
        let posts = client
            .list(Some(PostStatus::Draft))
            .await
            .expect("list should succeed");
        mock.assert();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "a");
    }

    #[tokio::test]
    async fn requests_are_sent_without_credential() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/posts/a")
                .header_missing("authorization");
            then.status(401).json_body(json!({ "error": "Unauthorized" }));
        });

        let client = client_for(&server, None);
        let err = client.delete("a").await.expect_err("server rejects");
        mock.assert();
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(
            err.body().and_then(ErrorBody::message).as_deref(),
            Some("Unauthorized")
        );
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn rejection_keeps_raw_text_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PATCH).path("/posts/a/publish");
            then.status(502).body("Bad Gateway");
        });

        let client = client_for(&server, Some("t"));
        let err = client.publish("a").await.expect_err("bad gateway");
        assert!(matches!(
            err,
            ApiError::Rejected {
                status: StatusCode::BAD_GATEWAY,
                body: ErrorBody::Text(ref text),
                ..
            } if text == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn success_with_unparsable_body_is_parse_fault() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/posts");
            then.status(200).body("<html>maintenance</html>");
        });

        let client = client_for(&server, None);
        let err = client.list(None).await.expect_err("parse fault");
        assert!(matches!(
            err,
            ApiError::Parse { status: StatusCode::OK, body: ErrorBody::Text(_), .. }
        ));
    }

    #[tokio::test]
    async fn empty_success_body_is_fine_for_mutations() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/posts/a/unpublish");
            then.status(204);
        });

        let client = client_for(&server, Some("t"));
        client.unpublish("a").await.expect("unpublish should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn create_forces_draft_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/posts")
                .json_body_includes(r#"{"status":"draft","type":"normal"}"#);
            then.status(201)
                .json_body(json!({ "_id": "new", "title": "Ha Long", "status": "draft" }));
        });

        let client = client_for(&server, Some("t"));
        let post = client
            .create(&sample_draft())
            .await
            .expect("create should succeed")
            .expect("created post echoed");
        mock.assert();
        assert_eq!(post.id, "new");
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn update_puts_full_field_set() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/posts/a").json_body(json!({
                "title": "T",
                "sapo": "S",
                "author": "A",
                "thumbnail": "https://img",
                "tags": "#t",
                "content": "<p>x</p>"
            }));
            then.status(200).json_body(json!({ "_id": "a", "title": "T" }));
        });

        let client = client_for(&server, Some("t"));
        let update = PostUpdate {
            title: "T".into(),
            sapo: "S".into(),
            author: "A".into(),
            thumbnail: "https://img".into(),
            tags: "#t".into(),
            content: "<p>x</p>".into(),
        };
        let post = client
            .update("a", &update)
            .await
            .expect("update")
            .expect("updated post echoed");
        mock.assert();
        assert_eq!(post.title, "T");
    }

    #[tokio::test]
    async fn update_without_body_is_saved() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/posts/a");
            then.status(204);
        });

        let client = client_for(&server, Some("t"));
        let update = PostUpdate {
            title: "T".into(),
            sapo: "S".into(),
            author: String::new(),
            thumbnail: String::new(),
            tags: String::new(),
            content: String::new(),
        };
        let saved = client.update("a", &update).await.expect("update");
        mock.assert();
        assert!(saved.is_none());
    }

    #[tokio::test]
    async fn login_and_upload_never_send_bearer() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .header_missing("authorization")
                .json_body(json!({ "username": "admin", "password": "pw" }));
            then.status(200)
                .json_body(json!({ "token": "tok", "user": { "username": "admin" } }));
        });
        let upload = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .header_missing("authorization")
                .body_includes("name=\"image\"");
            then.status(200)
                .json_body(json!({ "url": "https://cdn.example/a.png" }));
        });

        let client = client_for(&server, Some("held-token"));
        let session = client.login("admin", "pw").await.expect("login");
        assert_eq!(session.token, "tok");
        let uploaded = client
            .upload_image(vec![1, 2, 3], "a.png")
            .await
            .expect("upload");
        assert_eq!(uploaded.url, "https://cdn.example/a.png");
        login.assert();
        upload.assert();
    }

    #[tokio::test]
    async fn network_fault_is_reported() {
        let client = ResourceClient::new(
            "http://127.0.0.1:9".parse().expect("valid URL"),
            Duration::from_millis(500),
            None,
        )
        .expect("client builds");
        let err = client.list(None).await.expect_err("nothing listens on port 9");
        assert!(matches!(err, ApiError::Network { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let client = ResourceClient::with_client(
            Client::new(),
            "https://api.example/v2/".parse().expect("valid URL"),
            None,
        );
        let (url, path) = client
            .endpoint(&["posts", "a/b c"])
            .expect("endpoint builds");
        assert_eq!(url.as_str(), "https://api.example/v2/posts/a%2Fb%20c");
        assert_eq!(path, "/posts/a/b c");
    }

    #[test]
    fn image_mime_follows_extension() {
        assert_eq!(image_mime("x.PNG"), "image/png");
        assert_eq!(image_mime("x.jpeg"), "image/jpeg");
        assert_eq!(image_mime("x"), "application/octet-stream");
    }
}
