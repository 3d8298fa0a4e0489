use serde::Serialize;
use time::OffsetDateTime;

use super::{DataIntegrityError, Owned};

#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for ArticleRecord {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// API shape of an article. The owner id stays server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Article {
    pub fn from_record(record: Option<ArticleRecord>) -> Result<Self, DataIntegrityError> {
        record.map(Self::from).ok_or(DataIntegrityError)
    }

    pub fn from_records(records: Vec<ArticleRecord>) -> Vec<Self> {
        records.into_iter().map(Self::from).collect()
    }
}

impl From<ArticleRecord> for Article {
    fn from(record: ArticleRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            image: record.image,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> ArticleRecord {
        ArticleRecord {
            id,
            user_id: 7,
            title: format!("title {id}"),
            content: "body".to_string(),
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn projecting_a_missing_record_is_an_error() {
        assert!(Article::from_record(None).is_err());
    }

    #[test]
    fn projection_keeps_list_order() {
        let views = Article::from_records(vec![record(3), record(1), record(2)]);
        let ids: Vec<i64> = views.iter().map(|view| view.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn views_do_not_expose_the_owner() {
        let json = serde_json::to_value(Article::from(record(1))).unwrap();
        assert!(json.get("userId").is_none());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["id"], 1);
        assert!(json["createdAt"].is_string());
    }
}
