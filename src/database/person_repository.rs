//! Person repository: persons and their spouse names
//!
//! Writes are validated against the stored tree so the father links can never
//! form a cycle or point at a missing person.

use std::collections::HashMap;

use family_tree_types::{
    normalize_spouse_names, AdminPersonRow, ChildSummary, PersonDetail, PersonId, PersonInput,
    PersonRecord, SpouseName,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

const PERSON_COLUMNS: &str = "id, name, father_id, birth_date, job, lineage, photo_url, notes";

/// Why a father assignment was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatherCheck {
    Ok,
    MissingFather(PersonId),
    SelfReference,
    /// The proposed father descends from the person being edited
    WouldCycle(PersonId),
}

/// Outcome of a create or update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonWrite {
    Saved(PersonId),
    NotFound,
    /// Nothing was written
    Rejected(FatherCheck),
}

/// Outcome of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    HasChildren(i64),
}

#[derive(Clone)]
pub struct PersonRepository {
    pool: SqlitePool,
}

impl PersonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every person, ordered by id
    pub async fn list_all(&self) -> Result<Vec<PersonRecord>, sqlx::Error> {
        let rows = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(person_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM persons")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn get(&self, id: PersonId) -> Result<Option<PersonRecord>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(person_from_row).transpose()
    }

    pub async fn children_of(&self, id: PersonId) -> Result<Vec<ChildSummary>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, name FROM persons WHERE father_id = ?1 ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| ChildSummary {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    pub async fn spouses_of(&self, id: PersonId) -> Result<Vec<SpouseName>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT spouse_name, ord FROM person_spouses WHERE person_id = ?1 ORDER BY ord, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| SpouseName {
                spouse_name: r.get("spouse_name"),
                ord: r.get("ord"),
            })
            .collect())
    }

    /// Person plus direct children and ordered spouse names
    pub async fn detail(&self, id: PersonId) -> Result<Option<PersonDetail>, sqlx::Error> {
        let Some(person) = self.get(id).await? else {
            return Ok(None);
        };
        let children = self.children_of(id).await?;
        let spouses = self.spouses_of(id).await?;
        Ok(Some(PersonDetail {
            person,
            children,
            spouses,
        }))
    }

    /// Admin table rows: father name and joined spouse names, ordered by id
    pub async fn admin_rows(&self) -> Result<Vec<AdminPersonRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT p.id, p.name, p.father_id, p.birth_date, p.job, p.lineage,
                      p.photo_url, p.notes, f.name AS father_name
               FROM persons p
               LEFT JOIN persons f ON f.id = p.father_id
               ORDER BY p.id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let spouse_rows = sqlx::query(
            "SELECT person_id, spouse_name FROM person_spouses ORDER BY person_id, ord, id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut spouses: HashMap<PersonId, Vec<String>> = HashMap::new();
        for row in &spouse_rows {
            spouses
                .entry(row.get("person_id"))
                .or_default()
                .push(row.get("spouse_name"));
        }

        rows.iter()
            .map(|row| {
                let person = person_from_row(row)?;
                let spouses_text = spouses.get(&person.id).map(|names| names.join(" | "));
                Ok(AdminPersonRow {
                    father_name: row.try_get("father_name")?,
                    spouses_text,
                    person,
                })
            })
            .collect()
    }

    /// Father candidates for the admin form, ordered by name
    pub async fn father_options(
        &self,
        exclude: Option<PersonId>,
    ) -> Result<Vec<ChildSummary>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, name FROM persons ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| ChildSummary {
                id: r.get("id"),
                name: r.get("name"),
            })
            .filter(|c| Some(c.id) != exclude)
            .collect())
    }

    /// Insert a person and its spouse names. The father is checked in the
    /// same transaction as the insert.
    pub async fn create(&self, input: &PersonInput) -> Result<PersonWrite, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let check = father_check(&mut tx, None, input.father_id).await?;
        if check != FatherCheck::Ok {
            return Ok(PersonWrite::Rejected(check));
        }
        let id: PersonId = sqlx::query_scalar(
            r#"INSERT INTO persons (name, father_id, birth_date, job, lineage, photo_url, notes)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               RETURNING id"#,
        )
        .bind(input.name.trim())
        .bind(input.father_id)
        .bind(blank_to_none(&input.birth_date))
        .bind(blank_to_none(&input.job))
        .bind(blank_to_none(&input.lineage))
        .bind(blank_to_none(&input.photo_url))
        .bind(blank_to_none(&input.notes))
        .fetch_one(&mut *tx)
        .await?;
        replace_spouses(&mut tx, id, &input.spouse_names).await?;
        tx.commit().await?;
        Ok(PersonWrite::Saved(id))
    }

    /// Update a person and replace its spouse names
    pub async fn update(&self, id: PersonId, input: &PersonInput) -> Result<PersonWrite, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Ok(PersonWrite::NotFound);
        }
        let check = father_check(&mut tx, Some(id), input.father_id).await?;
        if check != FatherCheck::Ok {
            return Ok(PersonWrite::Rejected(check));
        }
        let result = sqlx::query(
            r#"UPDATE persons
               SET name = ?1, father_id = ?2, birth_date = ?3, job = ?4,
                   lineage = ?5, photo_url = ?6, notes = ?7
               WHERE id = ?8"#,
        )
        .bind(input.name.trim())
        .bind(input.father_id)
        .bind(blank_to_none(&input.birth_date))
        .bind(blank_to_none(&input.job))
        .bind(blank_to_none(&input.lineage))
        .bind(blank_to_none(&input.photo_url))
        .bind(blank_to_none(&input.notes))
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(PersonWrite::NotFound);
        }
        replace_spouses(&mut tx, id, &input.spouse_names).await?;
        tx.commit().await?;
        Ok(PersonWrite::Saved(id))
    }

    /// Delete a childless person and their spouse names
    pub async fn delete(&self, id: PersonId) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let children: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons WHERE father_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if children > 0 {
            return Ok(DeleteOutcome::HasChildren(children));
        }
        sqlx::query("DELETE FROM person_spouses WHERE person_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM persons WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(DeleteOutcome::NotFound);
        }
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Insert a fully specified row, used by seeding
    pub async fn insert_record(&self, record: &PersonRecord) -> Result<PersonId, sqlx::Error> {
        sqlx::query_scalar(
            r#"INSERT INTO persons (name, father_id, birth_date, job, lineage, photo_url, notes)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               RETURNING id"#,
        )
        .bind(&record.name)
        .bind(record.parent_id)
        .bind(&record.birth_date)
        .bind(&record.job)
        .bind(&record.lineage)
        .bind(&record.photo_url)
        .bind(&record.notes)
        .fetch_one(&self.pool)
        .await
    }
}

/// Can `father` be assigned to `person` (`None` when creating)?
async fn father_check(
    conn: &mut SqliteConnection,
    person: Option<PersonId>,
    father: Option<PersonId>,
) -> Result<FatherCheck, sqlx::Error> {
    let Some(father) = father else {
        return Ok(FatherCheck::Ok);
    };
    if person == Some(father) {
        return Ok(FatherCheck::SelfReference);
    }
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons WHERE id = ?1")
        .bind(father)
        .fetch_one(&mut *conn)
        .await?;
    if exists == 0 {
        return Ok(FatherCheck::MissingFather(father));
    }
    let Some(person) = person else {
        return Ok(FatherCheck::Ok);
    };

    // Walk up from the proposed father; UNION stops on stored cycles.
    let hit: i64 = sqlx::query_scalar(
        r#"WITH RECURSIVE chain(id, father_id) AS (
               SELECT id, father_id FROM persons WHERE id = ?1
               UNION
               SELECT p.id, p.father_id FROM persons p JOIN chain c ON p.id = c.father_id
           )
           SELECT COUNT(*) FROM chain WHERE id = ?2"#,
    )
    .bind(father)
    .bind(person)
    .fetch_one(&mut *conn)
    .await?;
    Ok(if hit > 0 {
        FatherCheck::WouldCycle(father)
    } else {
        FatherCheck::Ok
    })
}

async fn replace_spouses(
    tx: &mut Transaction<'_, Sqlite>,
    id: PersonId,
    names: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM person_spouses WHERE person_id = ?1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    for (i, name) in normalize_spouse_names(names).iter().enumerate() {
        sqlx::query("INSERT INTO person_spouses (person_id, spouse_name, ord) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(i as i64 + 1)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn person_from_row(row: &SqliteRow) -> Result<PersonRecord, sqlx::Error> {
    Ok(PersonRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        parent_id: row.try_get("father_id")?,
        birth_date: row.try_get("birth_date")?,
        job: row.try_get("job")?,
        lineage: row.try_get("lineage")?,
        photo_url: row.try_get("photo_url")?,
        notes: row.try_get("notes")?,
    })
}

/// Empty form fields are stored as NULL
fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{connect, DatabaseConfig};
    use pretty_assertions::assert_eq;

    async fn repo() -> PersonRepository {
        let pool = connect(&DatabaseConfig::in_memory()).await.unwrap();
        PersonRepository::new(pool)
    }

    async fn add(repo: &PersonRepository, input: &PersonInput) -> PersonId {
        match repo.create(input).await.unwrap() {
            PersonWrite::Saved(id) => id,
            other => panic!("create refused: {other:?}"),
        }
    }

    fn input(name: &str, father: Option<PersonId>) -> PersonInput {
        PersonInput {
            name: name.to_string(),
            father_id: father,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_and_read_detail() {
        let repo = repo().await;
        let root = add(&repo, &input("حسن", None)).await;
        let mut child = input("يوسف", Some(root));
        child.job = Some("  ".into());
        child.spouse_names = vec!["مريم".into(), " ".into(), "سارة".into()];
        let child_id = add(&repo, &child).await;

        let detail = repo.detail(root).await.unwrap().unwrap();
        assert_eq!(
            detail.children,
            vec![ChildSummary {
                id: child_id,
                name: "يوسف".into()
            }]
        );

        let child = repo.detail(child_id).await.unwrap().unwrap();
        assert_eq!(child.person.job, None);
        assert_eq!(
            child.spouses,
            vec![
                SpouseName { spouse_name: "مريم".into(), ord: 1 },
                SpouseName { spouse_name: "سارة".into(), ord: 2 },
            ]
        );
        assert!(repo.detail(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_rows_join_father_and_spouses() {
        let repo = repo().await;
        let root = add(&repo, &input("حسن", None)).await;
        let mut child = input("يوسف", Some(root));
        child.spouse_names = vec!["أ".into(), "ب".into()];
        add(&repo, &child).await;

        let rows = repo.admin_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].father_name, None);
        assert_eq!(rows[0].spouses_text, None);
        assert_eq!(rows[1].father_name.as_deref(), Some("حسن"));
        assert_eq!(rows[1].spouses_text.as_deref(), Some("أ | ب"));
    }

    #[tokio::test]
    async fn father_checks() {
        let repo = repo().await;
        let a = add(&repo, &input("a", None)).await;
        let b = add(&repo, &input("b", Some(a))).await;
        let c = add(&repo, &input("c", Some(b))).await;
        let mut conn = repo.pool().acquire().await.unwrap();

        assert_eq!(father_check(&mut conn, None, None).await.unwrap(), FatherCheck::Ok);
        assert_eq!(father_check(&mut conn, None, Some(c)).await.unwrap(), FatherCheck::Ok);
        assert_eq!(
            father_check(&mut conn, None, Some(77)).await.unwrap(),
            FatherCheck::MissingFather(77)
        );
        assert_eq!(
            father_check(&mut conn, Some(b), Some(b)).await.unwrap(),
            FatherCheck::SelfReference
        );
        assert_eq!(
            father_check(&mut conn, Some(a), Some(c)).await.unwrap(),
            FatherCheck::WouldCycle(c)
        );
        assert_eq!(father_check(&mut conn, Some(c), Some(a)).await.unwrap(), FatherCheck::Ok);
    }

    #[tokio::test]
    async fn writes_check_the_father_before_touching_rows() {
        let repo = repo().await;
        let a = add(&repo, &input("a", None)).await;
        let b = add(&repo, &input("b", Some(a))).await;

        assert_eq!(
            repo.create(&input("orphan", Some(99))).await.unwrap(),
            PersonWrite::Rejected(FatherCheck::MissingFather(99))
        );
        assert_eq!(repo.count().await.unwrap(), 2);

        let mut looped = input("a", Some(b));
        looped.spouse_names = vec!["x".into()];
        assert_eq!(
            repo.update(a, &looped).await.unwrap(),
            PersonWrite::Rejected(FatherCheck::WouldCycle(b))
        );
        assert_eq!(repo.get(a).await.unwrap().unwrap().parent_id, None);
        assert!(repo.spouses_of(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_refuses_parents() {
        let repo = repo().await;
        let a = add(&repo, &input("a", None)).await;
        let mut b = input("b", Some(a));
        b.spouse_names = vec!["x".into()];
        let b = add(&repo, &b).await;

        assert_eq!(repo.delete(a).await.unwrap(), DeleteOutcome::HasChildren(1));
        assert_eq!(repo.delete(b).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(repo.delete(b).await.unwrap(), DeleteOutcome::NotFound);
        assert!(repo.spouses_of(b).await.unwrap().is_empty());
        assert_eq!(repo.delete(a).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_replaces_spouses_and_reports_missing() {
        let repo = repo().await;
        let mut p = input("a", None);
        p.spouse_names = vec!["x".into(), "y".into()];
        let id = add(&repo, &p).await;

        p.name = "  renamed ".into();
        p.spouse_names = vec!["z".into()];
        assert_eq!(repo.update(id, &p).await.unwrap(), PersonWrite::Saved(id));
        let detail = repo.detail(id).await.unwrap().unwrap();
        assert_eq!(detail.person.name, "renamed");
        assert_eq!(detail.spouses.len(), 1);

        assert_eq!(repo.update(id + 100, &p).await.unwrap(), PersonWrite::NotFound);
    }

    #[tokio::test]
    async fn father_options_are_sorted_and_exclude_self() {
        let repo = repo().await;
        let z = add(&repo, &input("zed", None)).await;
        add(&repo, &input("amy", Some(z))).await;
        let names: Vec<String> = repo
            .father_options(Some(z))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["amy".to_string()]);
        assert_eq!(repo.father_options(None).await.unwrap()[0].name, "amy");
    }
}
