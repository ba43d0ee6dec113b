//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use serde::Serialize;

use crate::bulk::BulkOutcome;
use crate::cli::OutputFormat;
use crate::composer::ContentStats;
use crate::error::{CliError, CliResult};
use crate::render::{DetailBody, DetailView, DisplayRow, PostStats};
use crate::table::{Column, TableProfile};

const ELLIPSIS: char = '…';

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_rows(
    rows: &[DisplayRow],
    profile: &TableProfile,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Table => print!("{}", rows_table(rows, profile)),
    }
    Ok(())
}

const fn column_width(column: Column) -> usize {
    match column {
        Column::Id => 24,
        Column::Title => 40,
        Column::Author => 18,
        Column::Category => 20,
        Column::Status => 12,
        Column::CreatedAt => 19,
        Column::Actions => 0,
    }
}

fn cell(row: &DisplayRow, column: Column) -> String {
    match column {
        Column::Id => row.id.clone(),
        Column::Title => row.title.clone(),
        Column::Author => row.author.clone(),
        Column::Category => row.category.clone(),
        Column::Status => row.status.label.to_string(),
        Column::CreatedAt => row.created_at.clone(),
        Column::Actions => row
            .actions
            .iter()
            .map(|action| action.as_str())
            .collect::<Vec<_>>()
            .join(","),
    }
}

pub(crate) fn rows_table(rows: &[DisplayRow], profile: &TableProfile) -> String {
    let mut out = String::new();
    let line = |cells: Vec<String>| {
        cells
            .into_iter()
            .zip(profile.columns)
            .map(|(text, column)| match column_width(*column) {
                0 => text,
                width => pad(&truncate(&text, width), width),
            })
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_string()
    };
    let header = profile
        .columns
        .iter()
        .map(|column| column.header().to_string())
        .collect();
    out.push_str(&line(header));
    out.push('\n');
    for row in rows {
        let cells = profile
            .columns
            .iter()
            .map(|column| cell(row, *column))
            .collect();
        out.push_str(&line(cells));
        out.push('\n');
    }
    if rows.is_empty() {
        out.push_str("(no posts)\n");
    }
    out
}

/// Shorten `text` to at most `width` characters, marking the cut.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push(ELLIPSIS);
    cut
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}

pub(crate) fn render_detail(view: &DetailView, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(view)?,
        OutputFormat::Table => {
            println!("id: {}", view.id);
            println!("title: {}", view.title);
            println!("author: {}", view.author);
            println!("status: {}", view.status.label);
            println!("created: {}", view.created_at);
            if !view.sapo.is_empty() {
                println!("sapo: {}", view.sapo);
            }
            match &view.body {
                DetailBody::Frame { src, .. } => println!("emagazine: {src}"),
                DetailBody::Html { html } => {
                    println!("content:");
                    println!("{html}");
                }
                DetailBody::Missing => println!("emagazine: (no page link)"),
            }
        }
    }
    Ok(())
}

pub(crate) fn render_stats(stats: &PostStats, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(stats)?,
        OutputFormat::Table => {
            println!("total: {}", stats.total);
            println!("drafts: {}", stats.drafts);
            println!("published: {}", stats.published);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct BulkReport<'a> {
    operation: String,
    summary: String,
    items: Vec<BulkReportItem<'a>>,
}

#[derive(Serialize)]
struct BulkReportItem<'a> {
    id: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub(crate) fn render_bulk(outcome: &BulkOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let report = BulkReport {
                operation: outcome.operation.to_string(),
                summary: outcome.summary(),
                items: outcome
                    .items
                    .iter()
                    .map(|item| BulkReportItem {
                        id: &item.id,
                        ok: item.is_ok(),
                        error: item.result.as_ref().err().map(ToString::to_string),
                    })
                    .collect(),
            };
            print_json(&report)?;
        }
        OutputFormat::Table => print!("{}", bulk_table(outcome)),
    }
    Ok(())
}

pub(crate) fn bulk_table(outcome: &BulkOutcome) -> String {
    let mut out = String::new();
    for item in &outcome.items {
        let line = match &item.result {
            Ok(()) => format!("ok    {}\n", item.id),
            Err(err) => format!("FAIL  {}: {err}\n", item.id),
        };
        out.push_str(&line);
    }
    out.push_str(&outcome.summary());
    out.push('\n');
    out
}

pub(crate) fn render_content_stats(stats: &ContentStats) {
    println!(
        "{} words, {} chars, {} images, {} videos",
        stats.words, stats.chars, stats.images, stats.videos
    );
}
