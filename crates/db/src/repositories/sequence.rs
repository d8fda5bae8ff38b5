use async_trait::async_trait;
use sqlx::Row;

use tutur_core::identifier::{SequenceError, SequenceSource};

use crate::DbPool;

pub const GUIDE_SEQUENCE: &str = "tourist_guide";

/// Counter row in `guide_id_sequence`. Each call increments and reads in one
/// statement, so concurrent callers never observe the same value.
pub struct SqlSequenceSource {
    pool: DbPool,
    name: String,
}

impl SqlSequenceSource {
    pub fn new(pool: DbPool) -> Self {
        Self::named(pool, GUIDE_SEQUENCE)
    }

    pub fn named(pool: DbPool, name: impl Into<String>) -> Self {
        Self { pool, name: name.into() }
    }
}

#[async_trait]
impl SequenceSource for SqlSequenceSource {
    async fn next_value(&self) -> Result<u64, SequenceError> {
        let row = sqlx::query(
            "UPDATE guide_id_sequence SET value = value + 1 WHERE name = ? RETURNING value",
        )
        .bind(&self.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| SequenceError(error.to_string()))?;

        let Some(row) = row else {
            return Err(SequenceError(format!("sequence `{}` is not provisioned", self.name)));
        };

        let value: i64 = row.try_get("value").map_err(|error| SequenceError(error.to_string()))?;
        u64::try_from(value).map_err(|_| SequenceError(format!("negative sequence value {value}")))
    }
}
