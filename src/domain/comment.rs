use serde::Serialize;
use time::OffsetDateTime;

use super::{DataIntegrityError, Owned};

/// Full comment row. Exactly one of `article_id`/`product_id` is set,
/// enforced by a CHECK constraint.
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: i64,
    pub user_id: i64,
    pub article_id: Option<i64>,
    pub product_id: Option<i64>,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for CommentRecord {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Comment {
    pub fn from_record(record: Option<CommentRecord>) -> Result<Self, DataIntegrityError> {
        record.map(Self::from).ok_or(DataIntegrityError)
    }

    pub fn from_records(records: Vec<CommentRecord>) -> Vec<Self> {
        records.into_iter().map(Self::from).collect()
    }
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
