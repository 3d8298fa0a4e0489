use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;

use crate::domain::comment::CommentRecord;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_for_article(
        &self,
        user_id: i64,
        article_id: i64,
        content: String,
    ) -> Result<CommentRecord> {
        let row = sqlx::query(
            "INSERT INTO comments (user_id, article_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING id, user_id, article_id, product_id, content, created_at, updated_at",
        )
        .bind(user_id)
        .bind(article_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        Ok(map_comment(&row))
    }

    pub async fn create_for_product(
        &self,
        user_id: i64,
        product_id: i64,
        content: String,
    ) -> Result<CommentRecord> {
        let row = sqlx::query(
            "INSERT INTO comments (user_id, product_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING id, user_id, article_id, product_id, content, created_at, updated_at",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        Ok(map_comment(&row))
    }

    pub async fn get(&self, comment_id: i64) -> Result<Option<CommentRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, article_id, product_id, content, created_at, updated_at \
             FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_comment(&row)))
    }

    pub async fn update(&self, comment_id: i64, content: String) -> Result<Option<CommentRecord>> {
        let row = sqlx::query(
            "UPDATE comments \
             SET content = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, user_id, article_id, product_id, content, created_at, updated_at",
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_comment(&row)))
    }

    pub async fn delete(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Looks up the sort key of a cursor comment, scoped to its feed so a
    /// cursor from another feed cannot address this one. `None` means the
    /// cursor does not name a live comment here.
    pub async fn resolve_article_cursor(
        &self,
        article_id: i64,
        cursor_id: i64,
    ) -> Result<Option<(OffsetDateTime, i64)>> {
        let row = sqlx::query(
            "SELECT created_at, id FROM comments WHERE id = $1 AND article_id = $2",
        )
        .bind(cursor_id)
        .bind(article_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| (row.get("created_at"), row.get("id"))))
    }

    pub async fn resolve_product_cursor(
        &self,
        product_id: i64,
        cursor_id: i64,
    ) -> Result<Option<(OffsetDateTime, i64)>> {
        let row = sqlx::query(
            "SELECT created_at, id FROM comments WHERE id = $1 AND product_id = $2",
        )
        .bind(cursor_id)
        .bind(product_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| (row.get("created_at"), row.get("id"))))
    }

    /// Newest-first feed. When a start key is given the fetch begins at that
    /// comment inclusive, so handing the key of a not-yet-returned comment
    /// back in continues the walk without skipping it.
    pub async fn list_for_article(
        &self,
        article_id: i64,
        start: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<CommentRecord>> {
        let rows = match start {
            Some((created_at, comment_id)) => {
                sqlx::query(
                    "SELECT id, user_id, article_id, product_id, content, created_at, updated_at \
                     FROM comments \
                     WHERE article_id = $1 \
                       AND (created_at < $2 OR (created_at = $2 AND id <= $3)) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $4",
                )
                .bind(article_id)
                .bind(created_at)
                .bind(comment_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, article_id, product_id, content, created_at, updated_at \
                     FROM comments \
                     WHERE article_id = $1 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $2",
                )
                .bind(article_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(map_comment(&row));
        }

        Ok(comments)
    }

    pub async fn list_for_product(
        &self,
        product_id: i64,
        start: Option<(OffsetDateTime, i64)>,
        limit: i64,
    ) -> Result<Vec<CommentRecord>> {
        let rows = match start {
            Some((created_at, comment_id)) => {
                sqlx::query(
                    "SELECT id, user_id, article_id, product_id, content, created_at, updated_at \
                     FROM comments \
                     WHERE product_id = $1 \
                       AND (created_at < $2 OR (created_at = $2 AND id <= $3)) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $4",
                )
                .bind(product_id)
                .bind(created_at)
                .bind(comment_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, article_id, product_id, content, created_at, updated_at \
                     FROM comments \
                     WHERE product_id = $1 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $2",
                )
                .bind(product_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(map_comment(&row));
        }

        Ok(comments)
    }
}

fn map_comment(row: &PgRow) -> CommentRecord {
    CommentRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        article_id: row.get("article_id"),
        product_id: row.get("product_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
