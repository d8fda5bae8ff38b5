use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use tutur_core::domain::activity::{ActivityDocument, ActivityId, Destination};
use tutur_core::domain::itinerary::Itinerary;
use tutur_core::identifier::GuideId;

pub mod activity;
pub mod itinerary;
pub mod memory;
pub mod sequence;

pub use activity::SqlActivityRepository;
pub use itinerary::SqlItineraryRepository;
pub use memory::{InMemoryActivityRepository, InMemoryItineraryRepository, InMemorySequenceSource};
pub use sequence::SqlSequenceSource;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("duplicate key: {0}")]
    Duplicate(String),
}

/// Read side of the activity catalog plus the import path used by operators.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn find_many(&self, ids: &[ActivityId])
        -> Result<Vec<ActivityDocument>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<ActivityDocument>, RepositoryError>;

    async fn list_by_destination(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ActivityDocument>, RepositoryError>;

    /// Best rated activities in `city`, highest `totalScore` first. City
    /// matching ignores ASCII case.
    async fn list_by_city(
        &self,
        city: &str,
        limit: usize,
    ) -> Result<Vec<ActivityDocument>, RepositoryError>;

    async fn country_codes(&self) -> Result<Vec<String>, RepositoryError>;

    async fn destinations(&self) -> Result<Vec<Destination>, RepositoryError>;

    async fn upsert(&self, document: ActivityDocument) -> Result<(), RepositoryError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredItinerary {
    pub id: GuideId,
    pub client_id: Option<String>,
    pub itinerary: Itinerary,
    pub created_at: NaiveDateTime,
}

/// Insert-only store of finalized itineraries.
#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    /// Fails with [`RepositoryError::Duplicate`] when `id` is already stored.
    async fn insert(
        &self,
        id: &GuideId,
        client_id: Option<&str>,
        itinerary: &Itinerary,
    ) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &GuideId) -> Result<Option<StoredItinerary>, RepositoryError>;
}
