//! Context documents handed to the model alongside the planning prompt.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use tutur_core::domain::activity::{ActivityDocument, ActivityRecord};
use tutur_core::domain::guide::GuideQuery;
use tutur_db::repositories::ActivityRepository;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("knowledge retrieval failed: {0}")]
pub struct RetrievalError(pub String);

/// Catalog facts the model may plan with. The model is told to only use
/// `principal_id` values that appear here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KnowledgeDocument {
    pub principal_id: String,
    pub name: String,
    pub description: String,
    pub city: String,
    pub estimated_time: String,
    pub opening_hours: String,
    pub total_score: f64,
    pub reviews_count: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<ActivityRecord> for KnowledgeDocument {
    fn from(record: ActivityRecord) -> Self {
        Self {
            principal_id: record.principal_id.0,
            name: record.name,
            description: record.description,
            city: record.city,
            estimated_time: record.estimated_time,
            opening_hours: record.opening_hours,
            total_score: record.total_score,
            reviews_count: record.reviews_count,
            latitude: record.coordinates.latitude,
            longitude: record.coordinates.longitude,
        }
    }
}

#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(&self, query: &GuideQuery) -> Result<Vec<KnowledgeDocument>, RetrievalError>;
}

/// Pulls the best rated catalog entries for the requested city.
pub struct CatalogRetriever {
    repository: Arc<dyn ActivityRepository>,
    max_documents: usize,
}

impl CatalogRetriever {
    pub fn new(repository: Arc<dyn ActivityRepository>, max_documents: usize) -> Self {
        Self { repository, max_documents }
    }
}

#[async_trait]
impl KnowledgeRetriever for CatalogRetriever {
    async fn retrieve(&self, query: &GuideQuery) -> Result<Vec<KnowledgeDocument>, RetrievalError> {
        if self.max_documents == 0 {
            return Ok(Vec::new());
        }

        let documents = self
            .repository
            .list_by_city(&query.city, self.max_documents)
            .await
            .map_err(|error| RetrievalError(error.to_string()))?;

        Ok(documents.into_iter().map(to_knowledge).collect())
    }
}

fn to_knowledge(document: ActivityDocument) -> KnowledgeDocument {
    KnowledgeDocument::from(ActivityRecord::from(document))
}
