use chrono::NaiveDateTime;
use sqlx::Row;

use tutur_core::domain::guide::GUIDE_DATETIME_FORMAT;
use tutur_core::domain::itinerary::Itinerary;
use tutur_core::identifier::GuideId;

use super::{ItineraryRepository, RepositoryError, StoredItinerary};
use crate::DbPool;

pub struct SqlItineraryRepository {
    pool: DbPool,
}

impl SqlItineraryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ItineraryRepository for SqlItineraryRepository {
    async fn insert(
        &self,
        id: &GuideId,
        client_id: Option<&str>,
        itinerary: &Itinerary,
    ) -> Result<(), RepositoryError> {
        let itinerary_json =
            serde_json::to_string(itinerary).map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO guide_itinerary (id, client_id, itinerary_json) VALUES (?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(client_id)
        .bind(itinerary_json)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => {
                Err(RepositoryError::Duplicate(id.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn find_by_id(&self, id: &GuideId) -> Result<Option<StoredItinerary>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, client_id, itinerary_json, created_at FROM guide_itinerary WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let client_id: Option<String> =
            row.try_get("client_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let itinerary_json: String =
            row.try_get("itinerary_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at_str: String =
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let itinerary = serde_json::from_str(&itinerary_json)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at = NaiveDateTime::parse_from_str(&created_at_str, GUIDE_DATETIME_FORMAT)
            .map_err(|e| RepositoryError::Decode(format!("created_at `{created_at_str}`: {e}")))?;

        Ok(Some(StoredItinerary { id: id.clone(), client_id, itinerary, created_at }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use tutur_core::domain::itinerary::{ActivityEntry, Itinerary, ItineraryDay};
    use tutur_core::identifier::format_guide_id;

    use super::SqlItineraryRepository;
    use crate::repositories::{ItineraryRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlItineraryRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlItineraryRepository::new(pool)
    }

    fn itinerary() -> Itinerary {
        Itinerary::new(vec![
            ItineraryDay { day: 1, activities: vec![ActivityEntry::new("A", "Gold Museum")] },
            ItineraryDay { day: 2, activities: vec![] },
        ])
    }

    #[tokio::test]
    async fn insert_then_find_keeps_blob_and_client() {
        let repo = repo().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("date");
        let id = format_guide_id(now, 1).expect("id");

        repo.insert(&id, Some("client-9"), &itinerary()).await.expect("insert");

        let stored = repo.find_by_id(&id).await.expect("find").expect("present");
        assert_eq!(stored.id, id);
        assert_eq!(stored.client_id.as_deref(), Some("client-9"));
        assert_eq!(stored.itinerary, itinerary());
    }

    #[tokio::test]
    async fn missing_client_id_is_stored_as_null() {
        let repo = repo().await;
        let id = format_guide_id(Utc::now(), 2).expect("id");

        repo.insert(&id, None, &itinerary()).await.expect("insert");

        let stored = repo.find_by_id(&id).await.expect("find").expect("present");
        assert_eq!(stored.client_id, None);
    }

    #[tokio::test]
    async fn duplicate_identifier_is_rejected() {
        let repo = repo().await;
        let id = format_guide_id(Utc::now(), 3).expect("id");

        repo.insert(&id, None, &itinerary()).await.expect("first insert");
        let second = repo.insert(&id, Some("other"), &itinerary()).await;

        assert!(matches!(second, Err(RepositoryError::Duplicate(ref key)) if key == id.as_str()));
        let stored = repo.find_by_id(&id).await.expect("find").expect("present");
        assert_eq!(stored.client_id, None, "first write is never overwritten");
    }

    #[tokio::test]
    async fn unknown_identifier_yields_none() {
        let repo = repo().await;
        let id = format_guide_id(Utc::now(), 4).expect("id");
        assert!(repo.find_by_id(&id).await.expect("find").is_none());
    }
}
