use serde::Serialize;
use time::OffsetDateTime;

use super::{DataIntegrityError, Owned};

#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for ProductRecord {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Product {
    pub fn from_record(record: Option<ProductRecord>) -> Result<Self, DataIntegrityError> {
        record.map(Self::from).ok_or(DataIntegrityError)
    }

    pub fn from_records(records: Vec<ProductRecord>) -> Vec<Self> {
        records.into_iter().map(Self::from).collect()
    }
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            price: record.price,
            tags: record.tags,
            images: record.images,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
