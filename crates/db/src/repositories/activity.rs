use sqlx::{QueryBuilder, Row, Sqlite};

use tutur_core::domain::activity::{ActivityDocument, ActivityId, Destination};
use tutur_core::resolver::{ActivityLookup, LookupError};

use super::{ActivityRepository, RepositoryError};
use crate::DbPool;

/// Keys per `IN (...)` statement, well under SQLite's bind parameter limit.
const BATCH_CHUNK: usize = 500;

pub struct SqlActivityRepository {
    pool: DbPool,
}

impl SqlActivityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityDocument, RepositoryError> {
    let principal_id: String =
        row.try_get("principal_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let document_json: String =
        row.try_get("document_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let mut document: ActivityDocument = serde_json::from_str(&document_json).map_err(|e| {
        RepositoryError::Decode(format!("activity `{principal_id}` has invalid document: {e}"))
    })?;
    document.principal_id = ActivityId(principal_id);
    Ok(document)
}

fn rows_to_documents(
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<ActivityDocument>, RepositoryError> {
    rows.iter().map(row_to_document).collect()
}

#[async_trait::async_trait]
impl ActivityRepository for SqlActivityRepository {
    async fn find_many(
        &self,
        ids: &[ActivityId],
    ) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let mut documents = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(BATCH_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT principal_id, document_json FROM activity WHERE principal_id IN (",
            );
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.0.clone());
            }
            separated.push_unseparated(") ORDER BY principal_id");

            let rows = builder.build().fetch_all(&self.pool).await?;
            documents.extend(rows_to_documents(&rows)?);
        }

        Ok(documents)
    }

    async fn list_all(&self) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT principal_id, document_json FROM activity ORDER BY principal_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows_to_documents(&rows)
    }

    async fn list_by_destination(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT principal_id, document_json FROM activity
             WHERE destination_id = ?
             ORDER BY principal_id",
        )
        .bind(destination_id)
        .fetch_all(&self.pool)
        .await?;

        rows_to_documents(&rows)
    }

    async fn list_by_city(
        &self,
        city: &str,
        limit: usize,
    ) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT principal_id, document_json FROM activity
             WHERE city = ?
             ORDER BY COALESCE(json_extract(document_json, '$.totalScore'), 0) DESC, principal_id
             LIMIT ?",
        )
        .bind(city.trim())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows_to_documents(&rows)
    }

    async fn country_codes(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT country_code FROM activity
             WHERE country_code IS NOT NULL AND country_code <> ''
             ORDER BY country_code",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("country_code")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn destinations(&self) -> Result<Vec<Destination>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT destination_id, city, country_code FROM activity
             WHERE destination_id IS NOT NULL AND country_code IS NOT NULL
             ORDER BY destination_id, city, country_code",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Destination {
                    destination_id: row
                        .try_get("destination_id")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    city: row.try_get("city").map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    country_code: row
                        .try_get("country_code")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn upsert(&self, document: ActivityDocument) -> Result<(), RepositoryError> {
        if document.principal_id.as_str().trim().is_empty() {
            return Err(RepositoryError::Decode("activity principalId must not be empty".into()));
        }
        let document_json =
            serde_json::to_string(&document).map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO activity (principal_id, destination_id, country_code, city, document_json)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(principal_id) DO UPDATE SET
                 destination_id = excluded.destination_id,
                 country_code = excluded.country_code,
                 city = excluded.city,
                 document_json = excluded.document_json,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(document.principal_id.as_str())
        .bind(&document.destination_id)
        .bind(&document.country_code)
        .bind(&document.city)
        .bind(document_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ActivityLookup for SqlActivityRepository {
    async fn batch_get(&self, ids: &[ActivityId]) -> Result<Vec<ActivityDocument>, LookupError> {
        self.find_many(ids).await.map_err(|error| LookupError(error.to_string()))
    }
}
