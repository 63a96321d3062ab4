//! Terminal client for Jules coding-agent sessions.
//!
//! The [`diff`] module splits the unified diff attached to a change set into
//! per-file records; everything else wraps the Jules REST API and renders
//! sessions, plans, activities and code reviews.

pub mod app;
pub mod config;
pub mod diff;
pub mod editor;
pub mod filter;
pub mod format;
pub mod init;
pub mod jules;
pub mod review;
pub mod ui;
