#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

//! Editorial admin client for the Postdesk posts API.
//!
//! Layout:
//! - `client.rs`: resource client for `/posts`, auth and upload endpoints
//! - `cache.rs`: last fetched snapshot of the collection
//! - `filter.rs`: author, tag and category narrowing
//! - `table.rs`: table profiles for the dashboard and draft workspace
//! - `render.rs`: escaped display rows, detail views and counters
//! - `selection.rs`: row selection for bulk actions
//! - `bulk.rs`: sequential bulk mutations with per-id outcomes
//! - `composer.rs`: draft validation and editor helpers
//! - `controller.rs`: screen state tying the pieces together
//! - `session.rs`: stored login session
//! - `cli.rs`, `commands/`, `output.rs`, `error.rs`: the `postdesk` binary
//! - `main.rs`: thin entrypoint delegating to `run()`

pub mod bulk;
pub mod cache;
pub mod client;
pub mod composer;
pub mod controller;
pub mod filter;
pub mod render;
pub mod selection;
pub mod session;
pub mod table;

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod output;

pub use cli::run;
