//! Family tree site server
//!
//! Serves the family tree to the public viewer and an admin JSON API for
//! managing people, pages, the honor list and support messages.
//!
//! ```text
//! SQLite rows ──► family_tree_core::build_tree ──► /api/tree (nested JSON)
//!                                │
//!                                ├──► LayoutEngine ──► /api/tree/layout
//!                                └──► Scene + render_svg ──► /api/tree.svg
//! ```
//!
//! The tree is rebuilt from the database on every request, so admin edits are
//! visible immediately.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod seed;
pub mod telemetry;

pub use api::{build_router, AppState};
pub use error::AppError;
