//! Database connection and schema management
//!
//! SQLite pool setup, idempotent schema creation and the repositories that
//! sit on top of the pool.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, warn};

pub mod admin_repository;
pub mod cms_repository;
pub mod person_repository;

pub use admin_repository::{AdminAccount, AdminRepository};
pub use cms_repository::CmsRepository;
pub use person_repository::{DeleteOutcome, FatherCheck, PersonRepository, PersonWrite};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://family.db?mode=rwc".to_string()),
            max_connections: std::env::var("DATABASE_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl DatabaseConfig {
    /// Single shared in-memory database. One connection that never expires,
    /// otherwise every new connection would see an empty database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
        }
    }
}

/// Open the pool and make sure the schema exists.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    info!(
        "Connecting to database: {}",
        mask_database_url(&config.database_url)
    );

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connection_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime);
    if config.idle_timeout.is_none() {
        pool_options = pool_options.min_connections(1);
    }

    let pool = pool_options.connect_with(options).await.map_err(|e| {
        warn!("Failed to connect to database: {}", e);
        e
    })?;

    init_schema(&pool).await?;
    info!("Database ready");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS admins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS persons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        father_id INTEGER REFERENCES persons(id),
        birth_date TEXT,
        job TEXT,
        lineage TEXT,
        photo_url TEXT,
        notes TEXT
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_persons_father ON persons(father_id)",
    r#"CREATE TABLE IF NOT EXISTS person_spouses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        person_id INTEGER NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
        spouse_name TEXT NOT NULL,
        ord INTEGER NOT NULL DEFAULT 1
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_spouses_person ON person_spouses(person_id)",
    r#"CREATE TABLE IF NOT EXISTS site_pages (
        slug TEXT PRIMARY KEY,
        title TEXT,
        subtitle TEXT,
        content TEXT,
        updated_at TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS honor_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        field TEXT,
        achievement TEXT,
        photo_url TEXT,
        ord INTEGER NOT NULL DEFAULT 1
    )"#,
    r#"CREATE TABLE IF NOT EXISTS support_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_name TEXT,
        phone TEXT,
        topic TEXT,
        message TEXT,
        created_at TEXT DEFAULT (datetime('now'))
    )"#,
];

/// Default pages: slug, title, subtitle. Existing rows are left alone.
const DEFAULT_PAGES: [(&str, &str, &str); 3] = [
    ("about", "نبذة عن العائلة", "لمحة تاريخية مختصرة عن الجذور والمسار"),
    ("support", "الدعم والشكاوى", "أرسل اقتراحك أو بلاغك وسيتم مراجعته"),
    ("tree-pdf", "شجرة العائلة PDF", "عرض التصميم الرسمي داخل برواز مزخرف"),
];

/// Create every table and seed the fixed CMS pages.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    for (slug, title, subtitle) in DEFAULT_PAGES {
        sqlx::query(
            r#"INSERT OR IGNORE INTO site_pages (slug, title, subtitle, content, updated_at)
               VALUES (?1, ?2, ?3, '', datetime('now'))"#,
        )
        .bind(slug)
        .bind(title)
        .bind(subtitle)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Mask the password in a database URL for logging
fn mask_database_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let mut masked = parsed.clone();
            if parsed.password().is_some() {
                let _ = masked.set_password(Some("***"));
            }
            masked.to_string()
        }
        // Plain file paths carry nothing to hide
        Err(_) if !url.contains('@') => url.to_string(),
        Err(_) => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use family_tree_types::PAGE_SLUGS;

    #[test]
    fn masks_credentials_only() {
        assert_eq!(mask_database_url("sqlite://family.db?mode=rwc"), "sqlite://family.db?mode=rwc");
        assert_eq!(mask_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(mask_database_url("family.db"), "family.db");
        assert_eq!(
            mask_database_url("postgres://u:secret@db:5432/x"),
            "postgres://u:***@db:5432/x"
        );
        assert_eq!(mask_database_url("postgres://u@db/x"), "postgres://u@db/x");
        assert_eq!(mask_database_url("not a url:p@ss"), "***");
    }

    #[tokio::test]
    async fn schema_is_idempotent_and_seeds_pages() {
        let pool = connect(&DatabaseConfig::in_memory()).await.unwrap();
        sqlx::query("UPDATE site_pages SET title = 'edited' WHERE slug = 'about'")
            .execute(&pool)
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();

        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM site_pages ORDER BY slug")
            .fetch_all(&pool)
            .await
            .unwrap();
        let mut expected: Vec<String> = PAGE_SLUGS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(slugs, expected);

        let title: String = sqlx::query_scalar("SELECT title FROM site_pages WHERE slug = 'about'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(title, "edited");
    }
}
