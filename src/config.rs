//! Command line and environment configuration.
//!
//! Every flag has an environment fallback; `.env` is loaded by the binary
//! before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::auth::JwtConfig;
use crate::database::DatabaseConfig;

/// Only suitable for local development; a warning is logged when it is used.
pub const DEFAULT_JWT_SECRET: &str = "change-this-secret";

#[derive(Debug, Parser)]
#[command(name = "family-tree-server", version, about = "Family tree site: public tree API and admin CMS")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: ServerConfig,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the admin account and the sample family if the database is empty
    Seed {
        #[arg(long, env = "FAMILY_TREE_ADMIN_USER", default_value = "admin")]
        admin_username: String,
        #[arg(long, env = "FAMILY_TREE_ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
        admin_password: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://family.db?mode=rwc")]
    pub database_url: String,

    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 5)]
    pub pool_size: u32,

    #[arg(long, env = "FAMILY_TREE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Where uploaded photos are written; served under `/uploads`
    #[arg(long, env = "UPLOADS_DIR", default_value = "public/uploads")]
    pub uploads_dir: PathBuf,

    /// Static site root (index page, images)
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    #[arg(long, env = "FAMILY_TREE_JWT_SECRET", default_value = DEFAULT_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "FAMILY_TREE_TOKEN_TTL_HOURS", default_value_t = 12)]
    pub token_ttl_hours: u64,
}

impl ServerConfig {
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            database_url: self.database_url.clone(),
            max_connections: self.pool_size,
            ..DatabaseConfig::default()
        }
    }

    pub fn jwt(&self) -> JwtConfig {
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("FAMILY_TREE_JWT_SECRET is not set; using the development default");
        }
        JwtConfig::from_secret(
            self.jwt_secret.as_bytes(),
            Duration::from_secs(self.token_ttl_hours * 3600),
        )
    }
}
