use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::product::ProductRecord;
use crate::infra::db::Db;

use super::{escape_like_pattern, ListOrder};

#[derive(Clone)]
pub struct ProductService {
    db: Db,
}

impl ProductService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i64,
        name: String,
        description: String,
        price: i64,
        tags: Vec<String>,
        images: Vec<String>,
    ) -> Result<ProductRecord> {
        let row = sqlx::query(
            "INSERT INTO products (user_id, name, description, price, tags, images) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, name, description, price, tags, images, created_at, updated_at",
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(tags)
        .bind(images)
        .fetch_one(self.db.pool())
        .await?;

        Ok(map_product(&row))
    }

    pub async fn get(&self, product_id: i64) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, name, description, price, tags, images, created_at, updated_at \
             FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_product(&row)))
    }

    /// Partial update; absent fields keep their current value.
    pub async fn update(
        &self,
        product_id: i64,
        name: Option<String>,
        description: Option<String>,
        price: Option<i64>,
        tags: Option<Vec<String>>,
        images: Option<Vec<String>>,
    ) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "UPDATE products \
             SET name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 tags = COALESCE($5, tags), \
                 images = COALESCE($6, images), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, user_id, name, description, price, tags, images, created_at, updated_at",
        )
        .bind(product_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(tags)
        .bind(images)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_product(&row)))
    }

    pub async fn delete(&self, product_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Offset-paginated listing. The keyword matches name or description.
    pub async fn list(
        &self,
        order: ListOrder,
        keyword: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ProductRecord>, i64)> {
        let pattern = keyword.map(|keyword| format!("%{}%", escape_like_pattern(keyword)));

        let total_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE $1::text IS NULL \
                OR name LIKE $1 ESCAPE '\\' \
                OR description LIKE $1 ESCAPE '\\'",
        )
        .bind(&pattern)
        .fetch_one(self.db.pool())
        .await?;

        let sql = match order {
            ListOrder::Recent => {
                "SELECT id, user_id, name, description, price, tags, images, created_at, updated_at \
                 FROM products \
                 WHERE $1::text IS NULL \
                    OR name LIKE $1 ESCAPE '\\' \
                    OR description LIKE $1 ESCAPE '\\' \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT $2 OFFSET $3"
            }
            ListOrder::IdAsc => {
                "SELECT id, user_id, name, description, price, tags, images, created_at, updated_at \
                 FROM products \
                 WHERE $1::text IS NULL \
                    OR name LIKE $1 ESCAPE '\\' \
                    OR description LIKE $1 ESCAPE '\\' \
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

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(map_product(&row));
        }

        Ok((products, total_count))
    }

    /// Products the user has liked, newest like first.
    pub async fn liked_by_user(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ProductRecord>, i64)> {
        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_likes WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?;

        let rows = sqlx::query(
            "SELECT p.id, p.user_id, p.name, p.description, p.price, p.tags, p.images, \
                    p.created_at, p.updated_at \
             FROM product_likes l \
             JOIN products p ON p.id = l.product_id \
             WHERE l.user_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(map_product(&row));
        }

        Ok((products, total_count))
    }
}

fn map_product(row: &PgRow) -> ProductRecord {
    ProductRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        tags: row.get("tags"),
        images: row.get("images"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
