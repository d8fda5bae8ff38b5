use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};
use uuid::Uuid;

use tutur_agent::GuideGenerator;
use tutur_core::domain::guide::GuideRequest;
use tutur_core::errors::ApplicationError;
use tutur_core::identifier::IdentifierGenerator;
use tutur_core::reconcile::reconcile;
use tutur_core::resolver::ActivityResolver;
use tutur_core::response::{assemble_response, GuideEnvelope};

use crate::error::ApiError;
use crate::persistence::{PersistenceHandle, PersistenceJob, Submission};

/// Request-path pipeline for `POST /generate-guide`.
pub struct GuideService {
    generator: GuideGenerator,
    resolver: ActivityResolver,
    identifiers: IdentifierGenerator,
    persistence: PersistenceHandle,
}

impl GuideService {
    pub fn new(
        generator: GuideGenerator,
        resolver: ActivityResolver,
        identifiers: IdentifierGenerator,
        persistence: PersistenceHandle,
    ) -> Self {
        Self { generator, resolver, identifiers, persistence }
    }

    pub async fn create_guide(
        &self,
        request: &GuideRequest,
        correlation_id: &str,
    ) -> Result<GuideEnvelope, ApplicationError> {
        let query = request.validate()?;

        let proposed = self.generator.generate(&query, correlation_id).await?;
        let resolved = self.resolver.resolve(proposed.principal_ids()).await?;

        let reconciliation = reconcile(proposed, &resolved);
        if !reconciliation.dropped.is_empty() {
            let dropped: Vec<String> = reconciliation
                .dropped
                .iter()
                .map(|entry| {
                    entry
                        .principal_id
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| format!("<unnamed:{}>", entry.name))
                })
                .collect();
            warn!(
                event_name = "guide.reconcile.dropped",
                correlation_id,
                dropped = dropped.len(),
                principal_ids = %dropped.join(","),
                "model proposed activities missing from the catalog"
            );
        }

        let id = self.identifiers.next_id().await?;
        info!(
            event_name = "guide.generated",
            correlation_id,
            guide_id = %id,
            days = reconciliation.itinerary.days.len(),
            activities = reconciliation.kept(),
            "guide generated"
        );

        let submission = self.persistence.submit(PersistenceJob {
            id: id.clone(),
            client_id: query.client_id.clone(),
            itinerary: reconciliation.itinerary.clone(),
            correlation_id: correlation_id.to_string(),
        });
        if submission != Submission::Queued {
            warn!(
                event_name = "guide.persistence.not_queued",
                correlation_id,
                guide_id = %id,
                submission = ?submission,
                "guide returned without being queued for storage"
            );
        }

        Ok(assemble_response(id, reconciliation.itinerary))
    }
}

pub fn router(service: Arc<GuideService>) -> Router {
    Router::new().route("/generate-guide", post(generate_guide)).with_state(service)
}

pub async fn generate_guide(
    State(service): State<Arc<GuideService>>,
    payload: Result<Json<GuideRequest>, JsonRejection>,
) -> Result<Json<GuideEnvelope>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;

    match service.create_guide(&request, &correlation_id).await {
        Ok(envelope) => Ok(Json(envelope)),
        Err(error) => {
            warn!(
                event_name = "guide.request.failed",
                correlation_id = %correlation_id,
                error = %error,
                "guide request failed"
            );
            Err(ApiError::from_application(error, &correlation_id))
        }
    }
}
