//! CMS repository: site pages, honor list and support messages

use family_tree_types::{HonorInput, HonorItem, PageUpdate, SitePage, SupportMessage, SupportSubmission};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct CmsRepository {
    pool: SqlitePool,
}

impl CmsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    pub async fn page(&self, slug: &str) -> Result<Option<SitePage>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT slug, title, subtitle, content, updated_at FROM site_pages WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| page_from_row(&r)))
    }

    pub async fn pages(&self) -> Result<Vec<SitePage>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT slug, title, subtitle, content, updated_at FROM site_pages ORDER BY slug",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(page_from_row).collect())
    }

    /// Overwrite a page's text. Returns false for unknown slugs.
    pub async fn save_page(&self, slug: &str, update: &PageUpdate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE site_pages
               SET title = ?1, subtitle = ?2, content = ?3, updated_at = datetime('now')
               WHERE slug = ?4"#,
        )
        .bind(&update.title)
        .bind(&update.subtitle)
        .bind(&update.content)
        .bind(slug)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Honor list
    // ------------------------------------------------------------------

    pub async fn honor_items(&self) -> Result<Vec<HonorItem>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, name, field, achievement, photo_url, ord FROM honor_items ORDER BY ord, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(honor_from_row).collect())
    }

    pub async fn honor_item(&self, id: i64) -> Result<Option<HonorItem>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, name, field, achievement, photo_url, ord FROM honor_items WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| honor_from_row(&r)))
    }

    pub async fn create_honor(&self, input: &HonorInput) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"INSERT INTO honor_items (name, field, achievement, photo_url, ord)
               VALUES (?1, ?2, ?3, ?4, ?5)
               RETURNING id"#,
        )
        .bind(input.name.trim())
        .bind(&input.field)
        .bind(&input.achievement)
        .bind(&input.photo_url)
        .bind(honor_ord(input))
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_honor(&self, id: i64, input: &HonorInput) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE honor_items
               SET name = ?1, field = ?2, achievement = ?3, photo_url = ?4, ord = ?5
               WHERE id = ?6"#,
        )
        .bind(input.name.trim())
        .bind(&input.field)
        .bind(&input.achievement)
        .bind(&input.photo_url)
        .bind(honor_ord(input))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_honor(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM honor_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Support messages
    // ------------------------------------------------------------------

    /// Store a trimmed submission. Completeness is checked by the caller.
    pub async fn create_support_message(
        &self,
        submission: &SupportSubmission,
    ) -> Result<SupportMessage, sqlx::Error> {
        let s = submission.trimmed();
        let row = sqlx::query(
            r#"INSERT INTO support_messages (sender_name, phone, topic, message, created_at)
               VALUES (?1, ?2, ?3, ?4, datetime('now'))
               RETURNING id, sender_name, phone, topic, message, created_at"#,
        )
        .bind(&s.sender_name)
        .bind(&s.phone)
        .bind(&s.topic)
        .bind(&s.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(support_from_row(&row))
    }

    /// Newest first
    pub async fn support_messages(&self) -> Result<Vec<SupportMessage>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT id, sender_name, phone, topic, message, created_at
               FROM support_messages ORDER BY id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(support_from_row).collect())
    }

    pub async fn delete_support_message(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM support_messages WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn honor_ord(input: &HonorInput) -> i64 {
    match input.ord {
        Some(ord) if ord != 0 => ord,
        _ => 1,
    }
}

fn page_from_row(r: &SqliteRow) -> SitePage {
    SitePage {
        slug: r.get("slug"),
        title: r.get("title"),
        subtitle: r.get("subtitle"),
        content: r.get("content"),
        updated_at: r.get("updated_at"),
    }
}

fn honor_from_row(r: &SqliteRow) -> HonorItem {
    HonorItem {
        id: r.get("id"),
        name: r.get("name"),
        field: r.get("field"),
        achievement: r.get("achievement"),
        photo_url: r.get("photo_url"),
        ord: r.get("ord"),
    }
}

fn support_from_row(r: &SqliteRow) -> SupportMessage {
    SupportMessage {
        id: r.get("id"),
        sender_name: r.get("sender_name"),
        phone: r.get("phone"),
        topic: r.get("topic"),
        message: r.get("message"),
        created_at: r.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{connect, DatabaseConfig};
    use pretty_assertions::assert_eq;

    async fn repo() -> CmsRepository {
        CmsRepository::new(connect(&DatabaseConfig::in_memory()).await.unwrap())
    }

    #[tokio::test]
    async fn pages_save_and_reject_unknown_slug() {
        let repo = repo().await;
        let update = PageUpdate {
            title: "عن العائلة".into(),
            subtitle: String::new(),
            content: "<p>نص</p>".into(),
        };
        assert!(repo.save_page("about", &update).await.unwrap());
        assert!(!repo.save_page("missing", &update).await.unwrap());

        let page = repo.page("about").await.unwrap().unwrap();
        assert_eq!(page.title.as_deref(), Some("عن العائلة"));
        assert_eq!(page.subtitle.as_deref(), Some(""));
        assert!(page.updated_at.is_some());
        assert_eq!(repo.pages().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn honor_items_order_by_ord_then_id() {
        let repo = repo().await;
        let make = |name: &str, ord: Option<i64>| HonorInput {
            name: name.into(),
            ord,
            ..Default::default()
        };
        let late = repo.create_honor(&make("late", Some(5))).await.unwrap();
        repo.create_honor(&make("default", None)).await.unwrap();
        repo.create_honor(&make("zero", Some(0))).await.unwrap();

        let names: Vec<String> = repo.honor_items().await.unwrap().into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["default", "zero", "late"]);

        assert!(repo.update_honor(late, &make("first", Some(-1))).await.unwrap());
        assert_eq!(repo.honor_items().await.unwrap()[0].name, "first");
        assert!(repo.delete_honor(late).await.unwrap());
        assert!(!repo.delete_honor(late).await.unwrap());
        assert!(repo.honor_item(late).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn support_messages_are_trimmed_and_listed_newest_first() {
        let repo = repo().await;
        let first = repo
            .create_support_message(&SupportSubmission {
                sender_name: "  علي ".into(),
                message: " مرحبا ".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.sender_name.as_deref(), Some("علي"));
        assert_eq!(first.message.as_deref(), Some("مرحبا"));
        assert!(first.created_at.is_some());

        let second = repo
            .create_support_message(&SupportSubmission {
                sender_name: "b".into(),
                message: "m".into(),
                topic: "اقتراح".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let ids: Vec<i64> = repo.support_messages().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(repo.delete_support_message(first.id).await.unwrap());
        assert_eq!(repo.support_messages().await.unwrap().len(), 1);
    }
}
