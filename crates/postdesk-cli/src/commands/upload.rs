use std::path::Path;

use anyhow::anyhow;

use crate::cli::{AppContext, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output::print_json;

pub(crate) async fn handle_upload(ctx: &AppContext, path: &Path) -> CliResult<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CliError::validation(format!("'{}' is not a file", path.display())))?;
    let bytes = std::fs::read(path).map_err(|err| {
        CliError::failure(anyhow!(
            "failed to read image '{}': {err}",
            path.display()
        ))
    })?;

    let uploaded = ctx.client.upload_image(bytes, &file_name).await?;
    match ctx.output {
        OutputFormat::Json => print_json(&uploaded),
        OutputFormat::Table => {
            println!("{}", uploaded.url);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResourceClient;
    use crate::render::Locale;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn context_with(server: &MockServer) -> AppContext {
        AppContext {
            client: ResourceClient::with_client(
                Client::new(),
                server.base_url().parse().expect("valid URL"),
                None,
            ),
            output: OutputFormat::Table,
            locale: Locale::Vi,
            assume_yes: false,
        }
    }

    #[tokio::test]
    async fn upload_sends_file_bytes() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .body_includes("filename=\"cover.png\"");
            then.status(200)
                .json_body(json!({ "url": "https://cdn.example/cover.png" }));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cover.png");
        std::fs::write(&path, b"png").expect("write");

        handle_upload(&context_with(&server), &path)
            .await
            .expect("upload succeeds");
        mock.assert();
    }

    #[tokio::test]
    async fn missing_file_is_operational() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let err = handle_upload(&context_with(&server), &dir.path().join("absent.png"))
            .await
            .expect_err("missing file");
        assert_eq!(err.exit_code(), 3);
    }
}
