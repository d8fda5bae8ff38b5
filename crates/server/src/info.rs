//! Read-only catalog endpoints mounted under `/v1/tutur/info`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use tutur_core::domain::activity::{ActivityDocument, Destination};
use tutur_core::errors::ApplicationError;
use tutur_db::repositories::{ActivityRepository, RepositoryError};

use crate::error::ApiError;

pub const INFO_PREFIX: &str = "/v1/tutur/info";

#[derive(Clone)]
pub struct InfoState {
    activities: Arc<dyn ActivityRepository>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCodesResponse {
    pub country_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationsResponse {
    pub unique_items: Vec<Destination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRequest {
    #[serde(default)]
    pub destination_id: String,
}

pub fn router(activities: Arc<dyn ActivityRepository>) -> Router {
    Router::new()
        .route("/country-codes", get(country_codes))
        .route("/all-activities", get(all_activities))
        .route("/all-destinations", get(all_destinations))
        .route("/activities-by-destination", post(activities_by_destination))
        .with_state(InfoState { activities })
}

fn store_failure(error: RepositoryError, correlation_id: &str) -> ApiError {
    error!(
        event_name = "info.store.failed",
        correlation_id,
        error = %error,
        "activity store query failed"
    );
    ApiError::from_application(
        ApplicationError::Lookup(format!("activity store query failed: {error}")),
        correlation_id,
    )
}

pub async fn country_codes(
    State(state): State<InfoState>,
) -> Result<Json<CountryCodesResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let country_codes = state
        .activities
        .country_codes()
        .await
        .map_err(|error| store_failure(error, &correlation_id))?;
    Ok(Json(CountryCodesResponse { country_codes }))
}

pub async fn all_activities(
    State(state): State<InfoState>,
) -> Result<Json<ActivitiesResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let activities =
        state.activities.list_all().await.map_err(|error| store_failure(error, &correlation_id))?;
    Ok(Json(ActivitiesResponse { activities }))
}

pub async fn all_destinations(
    State(state): State<InfoState>,
) -> Result<Json<DestinationsResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let unique_items = state
        .activities
        .destinations()
        .await
        .map_err(|error| store_failure(error, &correlation_id))?;
    Ok(Json(DestinationsResponse { unique_items }))
}

pub async fn activities_by_destination(
    State(state): State<InfoState>,
    payload: Result<Json<DestinationRequest>, JsonRejection>,
) -> Result<Json<ActivitiesResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;

    let destination_id = request.destination_id.trim();
    if destination_id.is_empty() {
        return Err(ApiError::bad_request("destinationId is required", &correlation_id));
    }

    let activities = state
        .activities
        .list_by_destination(destination_id)
        .await
        .map_err(|error| store_failure(error, &correlation_id))?;
    if activities.is_empty() {
        return Err(ApiError::not_found("No records found", &correlation_id));
    }

    Ok(Json(ActivitiesResponse { activities }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use tutur_core::domain::activity::{ActivityDocument, ActivityId};
    use tutur_db::repositories::InMemoryActivityRepository;

    use super::{router, INFO_PREFIX};

    fn app() -> Router {
        let document = |id: &str, destination: &str, city: &str, country: &str| ActivityDocument {
            principal_id: ActivityId::from(id),
            destination_id: Some(destination.to_string()),
            city: Some(city.to_string()),
            country_code: Some(country.to_string()),
            name: Some(format!("activity {id}")),
            ..ActivityDocument::default()
        };
        let repository = InMemoryActivityRepository::with_documents([
            document("a1", "d-lim", "Lima", "PE"),
            document("a2", "d-lim", "Lima", "PE"),
            document("a3", "d-bog", "Bogota", "CO"),
        ]);
        Router::new().nest(INFO_PREFIX, router(Arc::new(repository)))
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("{INFO_PREFIX}{path}"))
            .body(Body::empty())
            .expect("request")
    }

    fn post_json(path: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("{INFO_PREFIX}{path}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn country_codes_are_unique() {
        let (status, body) = call(get("/country-codes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"countryCodes": ["CO", "PE"]}));
    }

    #[tokio::test]
    async fn all_activities_lists_raw_documents() {
        let (status, body) = call(get("/all-activities")).await;
        assert_eq!(status, StatusCode::OK);
        let activities = body["activities"].as_array().expect("activities");
        assert_eq!(activities.len(), 3);
        assert_eq!(activities[0]["principalId"], "a1");
        assert!(activities[0].get("description").is_none(), "absent fields stay absent");
    }

    #[tokio::test]
    async fn destinations_are_distinct_triples() {
        let (status, body) = call(get("/all-destinations")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["uniqueItems"],
            json!([
                {"destinationId": "d-bog", "city": "Bogota", "countryCode": "CO"},
                {"destinationId": "d-lim", "city": "Lima", "countryCode": "PE"}
            ])
        );
    }

    #[tokio::test]
    async fn activities_by_destination_filters() {
        let (status, body) =
            call(post_json("/activities-by-destination", json!({"destinationId": "d-lim"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activities"].as_array().expect("activities").len(), 2);
    }

    #[tokio::test]
    async fn empty_destination_is_rejected() {
        let (status, body) =
            call(post_json("/activities-by-destination", json!({"destinationId": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "destinationId is required");
    }

    #[tokio::test]
    async fn unknown_destination_is_not_found() {
        let (status, body) =
            call(post_json("/activities-by-destination", json!({"destinationId": "d-xyz"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No records found");
    }
}
