//! Shared application state

use std::path::PathBuf;

use family_tree_core::LayoutConfig;
use sqlx::SqlitePool;

use crate::auth::JwtConfig;
use crate::database::{AdminRepository, CmsRepository, PersonRepository};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: JwtConfig,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
    pub layout: LayoutConfig,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, uploads_dir: PathBuf, static_dir: PathBuf) -> Self {
        Self {
            pool,
            jwt,
            uploads_dir,
            static_dir,
            layout: LayoutConfig::default(),
        }
    }

    pub fn persons(&self) -> PersonRepository {
        PersonRepository::new(self.pool.clone())
    }

    pub fn cms(&self) -> CmsRepository {
        CmsRepository::new(self.pool.clone())
    }

    pub fn admins(&self) -> AdminRepository {
        AdminRepository::new(self.pool.clone())
    }
}
