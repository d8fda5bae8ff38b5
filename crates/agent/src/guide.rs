use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use tutur_core::domain::guide::GuideQuery;
use tutur_core::domain::itinerary::Itinerary;
use tutur_core::errors::ApplicationError;
use tutur_core::model_output::parse_model_output;

use crate::llm::LlmClient;
use crate::prompt::PromptRenderer;
use crate::retrieval::KnowledgeRetriever;

/// Turns a validated guide request into the model's raw itinerary proposal.
/// The proposal is not yet checked against the activity store.
pub struct GuideGenerator {
    llm: Arc<dyn LlmClient>,
    retriever: Arc<dyn KnowledgeRetriever>,
    renderer: PromptRenderer,
}

impl GuideGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<dyn KnowledgeRetriever>,
    ) -> Result<Self, ApplicationError> {
        let renderer =
            PromptRenderer::new().map_err(|error| ApplicationError::Configuration(error.to_string()))?;
        Ok(Self { llm, retriever, renderer })
    }

    pub async fn generate(
        &self,
        query: &GuideQuery,
        correlation_id: &str,
    ) -> Result<Itinerary, ApplicationError> {
        let knowledge = self
            .retriever
            .retrieve(query)
            .await
            .map_err(|error| ApplicationError::Lookup(error.to_string()))?;
        if knowledge.is_empty() {
            warn!(
                event_name = "guide.knowledge.empty",
                correlation_id,
                city = %query.city,
                "no catalog entries found for the requested city"
            );
        }

        let prompt = self
            .renderer
            .render(query, &knowledge)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        let started = Instant::now();
        let raw = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| ApplicationError::UpstreamGeneration(format!("{error:#}")))?;
        info!(
            event_name = "guide.model.completed",
            correlation_id,
            knowledge_documents = knowledge.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model answered guide prompt"
        );
        debug!(event_name = "guide.model.output", correlation_id, output = %raw, "raw model output");

        let itinerary = parse_model_output(&raw)?;
        Ok(itinerary)
    }
}
