use std::fs;

use anyhow::anyhow;
use postdesk_models::{Post, PostKind};

use crate::bulk::{BulkOperation, unique_ids};
use crate::cli::{AppContext, BodyArgs, ComposeArgs, EditArgs, OutputFormat};
use crate::client::{ApiError, ResourceClient};
use crate::composer::{ComposeInput, ContentScanner, youtube_to_embed};
use crate::controller::{ActionOutcome, AdminController};
use crate::error::{CliError, CliResult};
use crate::filter::PostFilter;
use crate::output::{
    print_json, render_bulk, render_content_stats, render_detail, render_rows, render_stats,
};
use crate::render::escape_html;
use crate::table::TableProfile;

fn controller(ctx: &AppContext, profile: TableProfile) -> AdminController<ResourceClient> {
    AdminController::new(ctx.client.clone(), profile, ctx.locale)
}

fn report_refresh(refresh: Option<ApiError>) {
    if let Some(err) = refresh {
        eprintln!("warning: post list could not be refreshed: {err}");
    }
}

pub(crate) async fn handle_list(
    ctx: &AppContext,
    profile: TableProfile,
    filter: PostFilter,
) -> CliResult<()> {
    let mut controller = controller(ctx, profile);
    controller.load().await?;
    controller.set_filter(filter);
    let rows = controller.render_rows();
    render_rows(&rows, controller.profile(), ctx.output)
}

pub(crate) async fn handle_stats(ctx: &AppContext) -> CliResult<()> {
    let mut controller = controller(ctx, TableProfile::dashboard());
    controller.load().await?;
    render_stats(&controller.stats(), ctx.output)
}

pub(crate) async fn handle_show(ctx: &AppContext, id: &str) -> CliResult<()> {
    let controller = controller(ctx, TableProfile::dashboard());
    let view = controller.view(id).await?;
    render_detail(&view, ctx.output)
}

pub(crate) async fn handle_action(
    ctx: &AppContext,
    operation: BulkOperation,
    ids: Vec<String>,
) -> CliResult<()> {
    let ids = unique_ids(&ids);
    let mut controller = controller(ctx, TableProfile::dashboard());
    let confirm = ctx.confirm();

    if let [id] = ids.as_slice() {
        let outcome = match operation {
            BulkOperation::Delete => controller.delete(id, confirm).await?,
            BulkOperation::Publish => controller.publish(id, confirm).await?,
            BulkOperation::Unpublish => controller.unpublish(id, confirm).await?,
        };
        match outcome {
            ActionOutcome::Cancelled => println!("Cancelled"),
            ActionOutcome::Completed { refresh, .. } => {
                println!("Post {id} {}", operation.verb());
                report_refresh(refresh);
            }
        }
        return Ok(());
    }

    match controller.bulk(operation, &ids, confirm).await? {
        ActionOutcome::Cancelled => {
            println!("Cancelled");
            Ok(())
        }
        ActionOutcome::Completed { value, refresh } => {
            render_bulk(&value, ctx.output)?;
            report_refresh(refresh);
            if value.all_succeeded() {
                Ok(())
            } else {
                Err(CliError::failure(anyhow!(value.summary())))
            }
        }
    }
}

/// Assemble HTML from inline content or a file, followed by embedded videos.
fn read_body(body: &BodyArgs) -> CliResult<Option<String>> {
    let mut html = match (&body.content, &body.content_file) {
        (Some(content), _) => Some(content.clone()),
        (None, Some(path)) => Some(fs::read_to_string(path).map_err(|err| {
            CliError::failure(anyhow!(
                "failed to read content file '{}': {err}",
                path.display()
            ))
        })?),
        (None, None) => None,
    };
    if !body.videos.is_empty() {
        let content = html.get_or_insert_with(String::new);
        for link in &body.videos {
            let src = escape_html(&youtube_to_embed(link));
            content.push_str(&format!(
                "<iframe src=\"{src}\" frameborder=\"0\" allowfullscreen></iframe>"
            ));
        }
    }
    Ok(html)
}

fn print_saved(post: Option<&Post>, verb: &str, format: OutputFormat) -> CliResult<()> {
    let Some(post) = post else {
        match format {
            OutputFormat::Json => print_json(&serde_json::Value::Null)?,
            OutputFormat::Table => println!("Draft {verb}"),
        }
        return Ok(());
    };
    match format {
        OutputFormat::Json => print_json(post),
        OutputFormat::Table => {
            println!("Draft {} {verb}", post.id);
            if post.kind == PostKind::Normal && !post.content.is_empty() {
                let scanner = ContentScanner::new().map_err(CliError::failure)?;
                render_content_stats(&scanner.content_stats(&post.content));
            }
            Ok(())
        }
    }
}

pub(crate) async fn handle_compose(ctx: &AppContext, args: ComposeArgs) -> CliResult<()> {
    let content = read_body(&args.body)?.unwrap_or_default();
    let input = ComposeInput {
        title: args.title,
        sapo: args.sapo,
        author: args.author,
        categories: args.categories,
        thumbnail: args.thumbnail,
        tags: args.tags,
        content,
        emag_page: args.emag_page.unwrap_or_default(),
    };

    let mut controller = controller(ctx, TableProfile::drafts());
    match controller.compose(&input).await? {
        ActionOutcome::Cancelled => {
            println!("Cancelled");
            Ok(())
        }
        ActionOutcome::Completed { value, refresh } => {
            print_saved(value.as_ref(), "created", ctx.output)?;
            report_refresh(refresh);
            Ok(())
        }
    }
}

pub(crate) async fn handle_edit(ctx: &AppContext, args: EditArgs) -> CliResult<()> {
    let content = read_body(&args.body)?;
    let mut controller = controller(ctx, TableProfile::dashboard());
    controller.load().await?;

    let EditArgs {
        id,
        title,
        sapo,
        author,
        thumbnail,
        tags,
        body: _,
    } = args;
    let outcome = controller
        .edit(&id, |update| {
            for (field, value) in [
                (&mut update.title, title),
                (&mut update.sapo, sapo),
                (&mut update.author, author),
                (&mut update.thumbnail, thumbnail),
                (&mut update.tags, tags),
                (&mut update.content, content),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
        })
        .await?;

    match outcome {
        ActionOutcome::Cancelled => {
            println!("Cancelled");
            Ok(())
        }
        ActionOutcome::Completed { value, refresh } => {
            print_saved(value.as_ref(), "updated", ctx.output)?;
            report_refresh(refresh);
            Ok(())
        }
    }
}
