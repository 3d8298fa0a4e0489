use serde::Serialize;
use time::OffsetDateTime;

use super::DataIntegrityError;

/// Full user row, password hash included. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn from_record(record: Option<UserRecord>) -> Result<Self, DataIntegrityError> {
        record.map(Self::from).ok_or(DataIntegrityError)
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            nickname: record.nickname,
            image: record.image,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
