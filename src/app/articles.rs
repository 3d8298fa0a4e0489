use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::article::ArticleRecord;
use crate::infra::db::Db;

use super::{escape_like_pattern, ListOrder};

#[derive(Clone)]
pub struct ArticleService {
    db: Db,
}

impl ArticleService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i64,
        title: String,
        content: String,
        image: Option<String>,
    ) -> Result<ArticleRecord> {
        let row = sqlx::query(
            "INSERT INTO articles (user_id, title, content, image) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, title, content, image, created_at, updated_at",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(image)
        .fetch_one(self.db.pool())
        .await?;

        Ok(map_article(&row))
    }

    pub async fn get(&self, article_id: i64) -> Result<Option<ArticleRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, title, content, image, created_at, updated_at \
             FROM articles WHERE id = $1",
        )
        .bind(article_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_article(&row)))
    }

    /// Partial update; absent fields keep their current value.
    pub async fn update(
        &self,
        article_id: i64,
        title: Option<String>,
        content: Option<String>,
        image: Option<String>,
    ) -> Result<Option<ArticleRecord>> {
        let row = sqlx::query(
            "UPDATE articles \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 image = COALESCE($4, image), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, user_id, title, content, image, created_at, updated_at",
        )
        .bind(article_id)
        .bind(title)
        .bind(content)
        .bind(image)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_article(&row)))
    }

    pub async fn delete(&self, article_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(article_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Offset-paginated listing with an optional title keyword filter.
    /// Returns the page plus the total row count under the same filter.
    pub async fn list(
        &self,
        order: ListOrder,
        keyword: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ArticleRecord>, i64)> {
        let pattern = keyword.map(|keyword| format!("%{}%", escape_like_pattern(keyword)));

        let total_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles \
             WHERE $1::text IS NULL OR title LIKE $1 ESCAPE '\\'",
        )
        .bind(&pattern)
        .fetch_one(self.db.pool())
        .await?;

        let sql = match order {
            ListOrder::Recent => {
                "SELECT id, user_id, title, content, image, created_at, updated_at \
                 FROM articles \
                 WHERE $1::text IS NULL OR title LIKE $1 ESCAPE '\\' \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT $2 OFFSET $3"
            }
            ListOrder::IdAsc => {
                "SELECT id, user_id, title, content, image, created_at, updated_at \
                 FROM articles \
                 WHERE $1::text IS NULL OR title LIKE $1 ESCAPE '\\' \
                 ORDER BY id ASC \
                 LIMIT $2 OFFSET $3"
            }
        };
        let rows = sqlx::query(sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            articles.push(map_article(&row));
        }

        Ok((articles, total_count))
    }

    /// Articles the user has liked, newest like first.
    pub async fn liked_by_user(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ArticleRecord>, i64)> {
        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM article_likes WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?;

        let rows = sqlx::query(
            "SELECT a.id, a.user_id, a.title, a.content, a.image, a.created_at, a.updated_at \
             FROM article_likes l \
             JOIN articles a ON a.id = l.article_id \
             WHERE l.user_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            articles.push(map_article(&row));
        }

        Ok((articles, total_count))
    }
}

fn map_article(row: &PgRow) -> ArticleRecord {
    ArticleRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        image: row.get("image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
