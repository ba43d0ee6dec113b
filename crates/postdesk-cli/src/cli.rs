//! Argument parsing, logging setup and command dispatch.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use postdesk_models::PostStatus;
use postdesk_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use url::Url;

use crate::bulk::BulkOperation;
use crate::client::{DEFAULT_TIMEOUT_SECS, ResourceClient, parse_url};
use crate::commands::auth::{handle_login, handle_logout};
use crate::commands::posts::{
    handle_action, handle_compose, handle_edit, handle_list, handle_show, handle_stats,
};
use crate::commands::upload::handle_upload;
use crate::controller::{AssumeYes, Confirm, StdinConfirm};
use crate::error::{CliError, CliResult};
use crate::filter::PostFilter;
use crate::render::Locale;
use crate::session::SessionStore;
use crate::table::TableProfile;

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Parses CLI arguments, executes the requested command and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let config = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: cli.log_format.unwrap_or(LogFormat::Pretty),
        build_sha: option_env!("POSTDESK_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: {err}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let Cli {
        api_url,
        timeout,
        session_file,
        token,
        output,
        locale,
        yes,
        log_format: _,
        command,
    } = cli;
    let sessions = session_file
        .map(SessionStore::new)
        .or_else(|| SessionStore::default_path().map(SessionStore::new));
    let timeout = Duration::from_secs(timeout);

    match command {
        Command::Login(args) => {
            let store = sessions.ok_or_else(missing_session_path)?;
            let client = build_client(api_url, timeout, None)?;
            handle_login(&client, &store, args).await
        }
        Command::Logout => {
            let store = sessions.ok_or_else(missing_session_path)?;
            handle_logout(&store)
        }
        command => {
            let token = resolve_token(token, sessions.as_ref())?;
            let ctx = AppContext {
                client: build_client(api_url, timeout, token)?,
                output,
                locale,
                assume_yes: yes,
            };
            dispatch_posts(&ctx, command).await
        }
    }
}

async fn dispatch_posts(ctx: &AppContext, command: Command) -> CliResult<()> {
    match command {
        Command::Ls(args) => {
            let mut profile = TableProfile::dashboard();
            profile.status_filter = args.status.map(PostStatus::from);
            handle_list(ctx, profile, args.filter.into()).await
        }
        Command::Drafts(args) => handle_list(ctx, TableProfile::drafts(), args.into()).await,
        Command::Stats => handle_stats(ctx).await,
        Command::Show(args) => handle_show(ctx, &args.id).await,
        Command::Publish(args) => handle_action(ctx, BulkOperation::Publish, args.ids).await,
        Command::Unpublish(args) => handle_action(ctx, BulkOperation::Unpublish, args.ids).await,
        Command::Delete(args) => handle_action(ctx, BulkOperation::Delete, args.ids).await,
        Command::Compose(args) => handle_compose(ctx, args).await,
        Command::Edit(args) => handle_edit(ctx, args).await,
        Command::Upload(args) => handle_upload(ctx, &args.file).await,
        Command::Login(_) | Command::Logout => Err(CliError::failure(anyhow!(
            "session commands are handled before the API context is built"
        ))),
    }
}

fn missing_session_path() -> CliError {
    CliError::validation(
        "cannot determine a session file location (pass --session-file or set POSTDESK_SESSION_FILE)",
    )
}

fn resolve_token(
    explicit: Option<String>,
    sessions: Option<&SessionStore>,
) -> CliResult<Option<String>> {
    if let Some(token) = explicit.filter(|token| !token.trim().is_empty()) {
        return Ok(Some(token));
    }
    match sessions {
        Some(store) => Ok(store.load()?.map(|session| session.token)),
        None => Ok(None),
    }
}

fn build_client(
    base_url: Url,
    timeout: Duration,
    token: Option<String>,
) -> CliResult<ResourceClient> {
    ResourceClient::new(base_url, timeout, token)
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Shared state handed to post command handlers.
pub(crate) struct AppContext {
    pub(crate) client: ResourceClient,
    pub(crate) output: OutputFormat,
    pub(crate) locale: Locale,
    pub(crate) assume_yes: bool,
}

impl AppContext {
    pub(crate) fn confirm(&self) -> &'static dyn Confirm {
        if self.assume_yes { &AssumeYes } else { &StdinConfirm }
    }
}

#[derive(Parser)]
#[command(
    name = "postdesk",
    version,
    about = "Editorial admin CLI for the Postdesk posts API"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "POSTDESK_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "POSTDESK_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) timeout: u64,
    #[arg(long, global = true, env = "POSTDESK_SESSION_FILE")]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "POSTDESK_TOKEN",
        hide_env_values = true,
        help = "Bearer token; overrides the stored session"
    )]
    pub(crate) token: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, value_enum, default_value_t = Locale::Vi)]
    pub(crate) locale: Locale,
    #[arg(
        short = 'y',
        long,
        global = true,
        help = "Skip confirmation prompts"
    )]
    pub(crate) yes: bool,
    #[arg(long, global = true, env = "POSTDESK_LOG_FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse().map_err(|err| format!("{err}"))
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in and store the session token.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// List posts on the dashboard.
    Ls(ListArgs),
    /// List drafts awaiting review.
    Drafts(FilterArgs),
    /// Count posts by status.
    Stats,
    /// Show one post.
    Show(ShowArgs),
    /// Publish one or more drafts.
    Publish(IdsArgs),
    /// Move one or more posts back to draft.
    Unpublish(IdsArgs),
    /// Delete one or more posts.
    Delete(IdsArgs),
    /// Create a new draft.
    Compose(ComposeArgs),
    /// Update a draft.
    Edit(EditArgs),
    /// Upload an image and print its URL.
    Upload(UploadArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StatusArg {
    Draft,
    Published,
}

impl From<StatusArg> for PostStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => Self::Draft,
            StatusArg::Published => Self::Published,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LoginArgs {
    #[arg(long, short = 'u', env = "POSTDESK_USERNAME")]
    pub(crate) username: String,
    #[arg(long, help = "Prompted for when omitted")]
    pub(crate) password: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FilterArgs {
    #[arg(long, help = "Case-insensitive substring of the author")]
    pub(crate) author: Option<String>,
    #[arg(long, help = "Case-insensitive substring of the hashtags")]
    pub(crate) tag: Option<String>,
    #[arg(long, help = "Exact category name")]
    pub(crate) category: Option<String>,
}

impl From<FilterArgs> for PostFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            author: args.author,
            tag: args.tag,
            category: args.category,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ListArgs {
    #[arg(long, value_enum)]
    pub(crate) status: Option<StatusArg>,
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ShowArgs {
    pub(crate) id: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct IdsArgs {
    #[arg(required = true)]
    pub(crate) ids: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ComposeArgs {
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long, default_value = "")]
    pub(crate) sapo: String,
    #[arg(long, default_value = "")]
    pub(crate) author: String,
    #[arg(long = "category", value_delimiter = ',')]
    pub(crate) categories: Vec<String>,
    #[arg(long, default_value = "")]
    pub(crate) thumbnail: String,
    #[arg(long, default_value = "")]
    pub(crate) tags: String,
    #[command(flatten)]
    pub(crate) body: BodyArgs,
    #[arg(long, help = "External page for emagazine posts")]
    pub(crate) emag_page: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct BodyArgs {
    #[arg(long, conflicts_with = "content_file", help = "Inline HTML content")]
    pub(crate) content: Option<String>,
    #[arg(long, help = "Read HTML content from a file")]
    pub(crate) content_file: Option<PathBuf>,
    #[arg(long = "video", help = "YouTube link appended as an embedded video")]
    pub(crate) videos: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct EditArgs {
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) title: Option<String>,
    #[arg(long)]
    pub(crate) sapo: Option<String>,
    #[arg(long)]
    pub(crate) author: Option<String>,
    #[arg(long)]
    pub(crate) thumbnail: Option<String>,
    #[arg(long)]
    pub(crate) tags: Option<String>,
    #[command(flatten)]
    pub(crate) body: BodyArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct UploadArgs {
    pub(crate) file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ids_and_global_flags_parse() {
        let cli = Cli::try_parse_from([
            "postdesk",
            "delete",
            "a",
            "b",
            "--yes",
            "--output",
            "json",
            "--api-url",
            "http://example.test/api",
        ])
        .expect("arguments parse");
        assert!(cli.yes);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.api_url.as_str(), "http://example.test/api");
        match cli.command {
            Command::Delete(args) => assert_eq!(args.ids, ["a", "b"]),
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn action_requires_an_id() {
        assert!(Cli::try_parse_from(["postdesk", "publish"]).is_err());
    }

    #[test]
    fn timeout_must_be_positive() {
        assert!(Cli::try_parse_from(["postdesk", "--timeout", "0", "stats"]).is_err());
        let cli = Cli::try_parse_from(["postdesk", "--timeout", "3", "stats"])
            .expect("arguments parse");
        assert_eq!(cli.timeout, 3);
    }

    #[test]
    fn compose_categories_split_on_commas() {
        let cli = Cli::try_parse_from([
            "postdesk",
            "compose",
            "--title",
            "T",
            "--category",
            "emagazine,travel",
            "--emag-page",
            "https://mag.example",
        ])
        .expect("arguments parse");
        match cli.command {
            Command::Compose(args) => {
                assert_eq!(args.categories, ["emagazine", "travel"]);
                assert_eq!(args.emag_page.as_deref(), Some("https://mag.example"));
            }
            _ => panic!("expected compose"),
        }
    }

    #[test]
    fn explicit_token_wins_over_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session.json"));
        store
            .save(&Session {
                token: "stored".into(),
                user: serde_json::Value::Null,
            })
            .expect("save");

        assert_eq!(
            resolve_token(Some("flag".into()), Some(&store)).expect("resolve"),
            Some("flag".into())
        );
        assert_eq!(
            resolve_token(Some("  ".into()), Some(&store)).expect("resolve"),
            Some("stored".into())
        );
        assert_eq!(resolve_token(None, None).expect("resolve"), None);
    }
}
