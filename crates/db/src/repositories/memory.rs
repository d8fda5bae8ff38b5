use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use tutur_core::domain::activity::{ActivityDocument, ActivityId, Destination};
use tutur_core::domain::itinerary::Itinerary;
use tutur_core::identifier::{GuideId, SequenceError, SequenceSource};
use tutur_core::resolver::{ActivityLookup, LookupError};

use super::{ActivityRepository, ItineraryRepository, RepositoryError, StoredItinerary};

#[derive(Default)]
pub struct InMemoryActivityRepository {
    activities: RwLock<BTreeMap<ActivityId, ActivityDocument>>,
}

impl InMemoryActivityRepository {
    pub fn with_documents(documents: impl IntoIterator<Item = ActivityDocument>) -> Self {
        let activities = documents
            .into_iter()
            .map(|document| (document.principal_id.clone(), document))
            .collect();
        Self { activities: RwLock::new(activities) }
    }
}

fn same_text(stored: Option<&String>, wanted: &str) -> bool {
    stored.map(|value| value.trim().eq_ignore_ascii_case(wanted.trim())).unwrap_or(false)
}

#[async_trait::async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn find_many(
        &self,
        ids: &[ActivityId],
    ) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let activities = self.activities.read().await;
        let wanted: BTreeSet<&ActivityId> = ids.iter().collect();
        Ok(wanted.into_iter().filter_map(|id| activities.get(id).cloned()).collect())
    }

    async fn list_all(&self) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let activities = self.activities.read().await;
        Ok(activities.values().cloned().collect())
    }

    async fn list_by_destination(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let activities = self.activities.read().await;
        Ok(activities
            .values()
            .filter(|document| document.destination_id.as_deref() == Some(destination_id))
            .cloned()
            .collect())
    }

    async fn list_by_city(
        &self,
        city: &str,
        limit: usize,
    ) -> Result<Vec<ActivityDocument>, RepositoryError> {
        let activities = self.activities.read().await;
        let mut matching: Vec<ActivityDocument> = activities
            .values()
            .filter(|document| same_text(document.city.as_ref(), city))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            let left_score = left.total_score.unwrap_or(0.0);
            let right_score = right.total_score.unwrap_or(0.0);
            right_score.total_cmp(&left_score).then_with(|| left.principal_id.cmp(&right.principal_id))
        });
        matching.truncate(limit);
        Ok(matching)
    }

    async fn country_codes(&self) -> Result<Vec<String>, RepositoryError> {
        let activities = self.activities.read().await;
        let codes: BTreeSet<String> = activities
            .values()
            .filter_map(|document| document.country_code.clone())
            .filter(|code| !code.is_empty())
            .collect();
        Ok(codes.into_iter().collect())
    }

    async fn destinations(&self) -> Result<Vec<Destination>, RepositoryError> {
        let activities = self.activities.read().await;
        let unique: BTreeSet<Destination> = activities
            .values()
            .filter_map(|document| {
                Some(Destination {
                    destination_id: document.destination_id.clone()?,
                    city: document.city.clone(),
                    country_code: document.country_code.clone()?,
                })
            })
            .collect();
        Ok(unique.into_iter().collect())
    }

    async fn upsert(&self, document: ActivityDocument) -> Result<(), RepositoryError> {
        if document.principal_id.as_str().trim().is_empty() {
            return Err(RepositoryError::Decode("activity principalId must not be empty".into()));
        }
        let mut activities = self.activities.write().await;
        activities.insert(document.principal_id.clone(), document);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ActivityLookup for InMemoryActivityRepository {
    async fn batch_get(&self, ids: &[ActivityId]) -> Result<Vec<ActivityDocument>, LookupError> {
        self.find_many(ids).await.map_err(|error| LookupError(error.to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryItineraryRepository {
    itineraries: RwLock<HashMap<GuideId, StoredItinerary>>,
}

impl InMemoryItineraryRepository {
    pub async fn len(&self) -> usize {
        self.itineraries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.itineraries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ItineraryRepository for InMemoryItineraryRepository {
    async fn insert(
        &self,
        id: &GuideId,
        client_id: Option<&str>,
        itinerary: &Itinerary,
    ) -> Result<(), RepositoryError> {
        let mut itineraries = self.itineraries.write().await;
        if itineraries.contains_key(id) {
            return Err(RepositoryError::Duplicate(id.to_string()));
        }
        itineraries.insert(
            id.clone(),
            StoredItinerary {
                id: id.clone(),
                client_id: client_id.map(str::to_owned),
                itinerary: itinerary.clone(),
                created_at: Utc::now().naive_utc(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &GuideId) -> Result<Option<StoredItinerary>, RepositoryError> {
        let itineraries = self.itineraries.read().await;
        Ok(itineraries.get(id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySequenceSource {
    value: AtomicU64,
}

impl InMemorySequenceSource {
    pub fn starting_at(value: u64) -> Self {
        Self { value: AtomicU64::new(value) }
    }
}

#[async_trait::async_trait]
impl SequenceSource for InMemorySequenceSource {
    async fn next_value(&self) -> Result<u64, SequenceError> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
