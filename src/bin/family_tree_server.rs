//! Family tree site server
//!
//! `family-tree-server [serve]` runs the HTTP API; `family-tree-server seed`
//! creates the admin account and the sample family.

use anyhow::Context;
use clap::Parser;

use family_tree::config::{Cli, Command};
use family_tree::{build_router, database, seed, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let config = cli.config.clone();

    let pool = database::connect(&config.database())
        .await
        .context("failed to open database")?;

    match cli.command() {
        Command::Seed {
            admin_username,
            admin_password,
        } => {
            let report = seed::run(&pool, &admin_username, &admin_password)
                .await
                .context("seeding failed")?;
            tracing::info!(
                admin_created = report.admin_created,
                persons_inserted = report.persons_inserted,
                "seed complete"
            );
            Ok(())
        }
        Command::Serve => {
            tokio::fs::create_dir_all(&config.uploads_dir)
                .await
                .with_context(|| format!("cannot create {}", config.uploads_dir.display()))?;

            let state = AppState::new(
                pool,
                config.jwt(),
                config.uploads_dir.clone(),
                config.static_dir.clone(),
            );
            let app = build_router(state);

            tracing::info!("Family tree server listening on http://{}", config.bind);
            tracing::info!("Static files from {}", config.static_dir.display());
            tracing::info!("Uploads in {}", config.uploads_dir.display());

            let listener = match tokio::net::TcpListener::bind(config.bind).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Failed to bind to {}: {}", config.bind, e);
                    return Err(e).context("bind failed");
                }
            };

            axum::serve(listener, app).await.context("server error")
        }
    }
}
