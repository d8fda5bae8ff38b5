//! Bulk resolution of itinerary ids against the activity store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::activity::{ActivityDocument, ActivityId, ActivityRecord};

pub type ResolvedActivities = HashMap<ActivityId, ActivityRecord>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("activity lookup failed: {0}")]
pub struct LookupError(pub String);

/// Key lookup against the activity store. Keys with no stored document are
/// simply absent from the returned list.
#[async_trait]
pub trait ActivityLookup: Send + Sync {
    async fn batch_get(&self, ids: &[ActivityId]) -> Result<Vec<ActivityDocument>, LookupError>;
}

#[derive(Clone)]
pub struct ActivityResolver {
    lookup: Arc<dyn ActivityLookup>,
}

impl ActivityResolver {
    pub fn new(lookup: Arc<dyn ActivityLookup>) -> Self {
        Self { lookup }
    }

    /// Resolves every distinct id with a single bulk fetch. An empty request
    /// never reaches the store.
    pub async fn resolve<I>(&self, ids: I) -> Result<ResolvedActivities, LookupError>
    where
        I: IntoIterator<Item = ActivityId>,
    {
        let requested: BTreeSet<ActivityId> = ids.into_iter().collect();
        if requested.is_empty() {
            return Ok(ResolvedActivities::new());
        }

        let keys: Vec<ActivityId> = requested.iter().cloned().collect();
        let documents = self.lookup.batch_get(&keys).await?;

        Ok(documents
            .into_iter()
            .filter(|document| requested.contains(&document.principal_id))
            .map(|document| (document.principal_id.clone(), ActivityRecord::from(document)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::{ActivityLookup, ActivityResolver, LookupError};
    use crate::domain::activity::{ActivityDocument, ActivityId};

    #[derive(Default)]
    struct RecordingLookup {
        documents: HashMap<ActivityId, ActivityDocument>,
        calls: Mutex<Vec<Vec<ActivityId>>>,
    }

    impl RecordingLookup {
        fn with(ids: &[&str]) -> Self {
            let documents = ids
                .iter()
                .map(|id| {
                    let document = ActivityDocument {
                        principal_id: ActivityId::from(*id),
                        description: Some(format!("about {id}")),
                        ..ActivityDocument::default()
                    };
                    (ActivityId::from(*id), document)
                })
                .collect();
            Self { documents, calls: Mutex::default() }
        }
    }

    #[async_trait]
    impl ActivityLookup for RecordingLookup {
        async fn batch_get(
            &self,
            ids: &[ActivityId],
        ) -> Result<Vec<ActivityDocument>, LookupError> {
            self.calls.lock().await.push(ids.to_vec());
            Ok(ids.iter().filter_map(|id| self.documents.get(id).cloned()).collect())
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl ActivityLookup for BrokenLookup {
        async fn batch_get(&self, _ids: &[ActivityId]) -> Result<Vec<ActivityDocument>, LookupError> {
            Err(LookupError("store unreachable".to_string()))
        }
    }

    fn ids(raw: &[&str]) -> Vec<ActivityId> {
        raw.iter().map(|id| ActivityId::from(*id)).collect()
    }

    #[tokio::test]
    async fn duplicates_are_fetched_once_in_a_single_call() {
        let lookup = Arc::new(RecordingLookup::with(&["A", "B"]));
        let resolver = ActivityResolver::new(lookup.clone());

        let resolved = resolver.resolve(ids(&["B", "A", "B", "A", "A"])).await.expect("resolve");

        let calls = lookup.calls.lock().await;
        assert_eq!(calls.len(), 1, "exactly one bulk fetch");
        assert_eq!(calls[0], ids(&["A", "B"]), "each unique id requested once");
        assert_eq!(resolved.len(), 2);
    }

    #[tokio::test]
    async fn missing_ids_are_omitted_without_error() {
        let lookup = Arc::new(RecordingLookup::with(&["A"]));
        let resolver = ActivityResolver::new(lookup);

        let resolved = resolver.resolve(ids(&["A", "X"])).await.expect("partial miss is fine");

        assert!(resolved.contains_key(&ActivityId::from("A")));
        assert!(!resolved.contains_key(&ActivityId::from("X")));
        assert_eq!(resolved[&ActivityId::from("A")].description, "about A");
        assert_eq!(resolved[&ActivityId::from("A")].reviews_count, 0);
    }

    #[tokio::test]
    async fn empty_request_skips_the_store() {
        let lookup = Arc::new(RecordingLookup::with(&["A"]));
        let resolver = ActivityResolver::new(lookup.clone());

        let resolved = resolver.resolve(Vec::new()).await.expect("resolve nothing");

        assert!(resolved.is_empty());
        assert!(lookup.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_a_lookup_error() {
        let resolver = ActivityResolver::new(Arc::new(BrokenLookup));

        let error = resolver.resolve(ids(&["A"])).await.expect_err("store is down");
        assert_eq!(error, LookupError("store unreachable".to_string()));
    }
}
