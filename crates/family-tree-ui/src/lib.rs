//! Native family tree viewer
//!
//! A thin egui shell around `family_tree_core::ViewSession`: the canvas turns
//! pointer input into view events, the app feeds them to the session and
//! fetches person details from the server.

pub mod api;
pub mod app;
pub mod widget;

pub use api::ApiClient;
pub use app::{FamilyTreeApp, ViewerConfig};
