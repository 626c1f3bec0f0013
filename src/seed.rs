//! Initial data: the admin account and a small sample family.
//!
//! Safe to run repeatedly: the admin insert is skipped when the username
//! exists and the family is only inserted into an empty persons table.

use family_tree_types::{PersonId, PersonRecord};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::auth::hash_password;
use crate::database::{AdminRepository, PersonRepository};

pub const SAMPLE_LINEAGE: &str = "من الحقيل";

/// (name, children) in insertion order
type Branch = (&'static str, &'static [&'static str]);

const SAMPLE_ROOT_LINE: [&str; 3] = ["حسن", "يوسف", "حجاج"];
const SAMPLE_BRANCHES: [Branch; 3] = [
    ("حازم", &["صقر", "رحيم", "يزن"]),
    ("حسن", &["حجاج", "أحمد"]),
    ("حسام", &["حازم", "عمار", "ركان"]),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub persons_inserted: usize,
}

pub async fn run(
    pool: &SqlitePool,
    admin_username: &str,
    admin_password: &str,
) -> Result<SeedReport, SeedError> {
    let password_hash = hash_password(admin_password)?;
    let admin_created = AdminRepository::new(pool.clone())
        .create_if_missing(admin_username, &password_hash)
        .await?;
    if admin_created {
        info!(username = admin_username, "admin account created");
    }

    let persons = PersonRepository::new(pool.clone());
    let persons_inserted = if persons.count().await? == 0 {
        insert_sample_family(&persons).await?
    } else {
        info!("persons table not empty; skipping sample family");
        0
    };

    Ok(SeedReport {
        admin_created,
        persons_inserted,
    })
}

async fn insert_sample_family(repo: &PersonRepository) -> Result<usize, sqlx::Error> {
    let mut inserted = 0;
    let mut father = None;
    for name in SAMPLE_ROOT_LINE {
        father = Some(repo.insert_record(&sample(name, father)).await?);
        inserted += 1;
    }
    for (branch, children) in SAMPLE_BRANCHES {
        let branch_id = repo.insert_record(&sample(branch, father)).await?;
        inserted += 1;
        for child in children {
            repo.insert_record(&sample(child, Some(branch_id))).await?;
            inserted += 1;
        }
    }
    info!(count = inserted, "sample family inserted");
    Ok(inserted)
}

fn sample(name: &str, father: Option<PersonId>) -> PersonRecord {
    let mut record = PersonRecord::new(0, name, father);
    record.lineage = Some(SAMPLE_LINEAGE.to_string());
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{connect, DatabaseConfig};
    use family_tree_core::build_tree;

    #[tokio::test]
    async fn seeding_is_idempotent_and_builds_one_tree() {
        let pool = connect(&DatabaseConfig::in_memory()).await.unwrap();
        let first = run(&pool, "admin", "admin123").await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                admin_created: true,
                persons_inserted: 14
            }
        );
        let second = run(&pool, "admin", "other").await.unwrap();
        assert_eq!(second, SeedReport::default());

        let records = PersonRepository::new(pool.clone()).list_all().await.unwrap();
        assert!(records.iter().all(|r| r.lineage.as_deref() == Some(SAMPLE_LINEAGE)));
        let tree = build_tree(records).unwrap().unwrap();
        assert_eq!(tree.len(), 14);
        assert_eq!(tree[tree.root()].person.name, "حسن");
        assert_eq!(tree.max_depth(), 4);
    }
}
