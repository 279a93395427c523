//! # Orgadmin (Organization Settings Service)
//!
//! `orgadmin` serves the administrative settings of an organization account:
//! renaming and profile edits, visibility changes cascaded to every owned
//! repository, custom avatars, deletion, webhooks, label templates and build
//! runners.
//!
//! ## Layout
//!
//! - [`settings`]: the controller. It talks to storage only through the
//!   registry traits and returns an `Outcome` (render, redirect, or JSON
//!   redirect) for the HTTP layer.
//! - [`storage`]: Postgres-backed registries (`sqlx`) and the on-disk avatar
//!   store.
//! - [`orgadmin`]: the axum application, OpenAPI document and server bootstrap.
//! - [`cli`]: argument parsing, telemetry and the server action.
//!
//! ## Authorization
//!
//! Every settings route requires a session whose account owns the
//! organization or is a site administrator. Anyone else receives
//! `404 Not Found`, so organization existence does not leak.

pub mod cli;
pub mod orgadmin;
pub mod settings;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
