use anyhow::Result;
use sqlx::Row;

use crate::infra::db::Db;

#[derive(Clone)]
pub struct LikeService {
    db: Db,
}

impl LikeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Flips the like state and returns the state after the call:
    /// `true` when the like now exists, `false` when it was removed.
    /// A racing duplicate insert hits the unique constraint and is
    /// absorbed by ON CONFLICT, so both racers see `true`.
    pub async fn toggle_article(&self, user_id: i64, article_id: i64) -> Result<bool> {
        let existing: Option<i64> = sqlx::query(
            "SELECT id FROM article_likes WHERE user_id = $1 AND article_id = $2",
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_optional(self.db.pool())
        .await?
        .map(|row| row.get("id"));

        if let Some(like_id) = existing {
            sqlx::query("DELETE FROM article_likes WHERE id = $1")
                .bind(like_id)
                .execute(self.db.pool())
                .await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO article_likes (user_id, article_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(article_id)
        .execute(self.db.pool())
        .await?;

        Ok(true)
    }

    pub async fn toggle_product(&self, user_id: i64, product_id: i64) -> Result<bool> {
        let existing: Option<i64> = sqlx::query(
            "SELECT id FROM product_likes WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.db.pool())
        .await?
        .map(|row| row.get("id"));

        if let Some(like_id) = existing {
            sqlx::query("DELETE FROM product_likes WHERE id = $1")
                .bind(like_id)
                .execute(self.db.pool())
                .await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO product_likes (user_id, product_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.db.pool())
        .await?;

        Ok(true)
    }
}
