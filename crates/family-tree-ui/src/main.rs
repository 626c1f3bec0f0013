//! Native entry point for the family tree viewer

use std::path::PathBuf;

use family_tree_ui::{FamilyTreeApp, ViewerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_API: &str = "http://localhost:3000";

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "family_tree_ui=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ViewerConfig {
        api_base: std::env::var("FAMILY_TREE_API").unwrap_or_else(|_| DEFAULT_API.to_string()),
        log_path: std::env::var_os("FAMILY_TREE_SESSION_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("session-log.json")),
        font: std::env::var_os("FAMILY_TREE_FONT").map(PathBuf::from),
    };
    tracing::info!(api = %config.api_base, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("شجرة العائلة")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "family-tree-viewer",
        options,
        Box::new(move |cc| create_app(cc, config)),
    )
}

fn create_app(
    cc: &eframe::CreationContext<'_>,
    config: ViewerConfig,
) -> Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>> {
    Ok(Box::new(FamilyTreeApp::new(cc, config)?))
}
