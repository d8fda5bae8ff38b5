use thiserror::Error;

use crate::domain::itinerary::Itinerary;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelOutputError {
    #[error("empty response from the model")]
    Empty,
    #[error("model response is not a valid itinerary: {0}")]
    Malformed(String),
}

/// Parses the free-text model answer into an itinerary. The JSON object may be
/// wrapped in a markdown code fence.
pub fn parse_model_output(raw: &str) -> Result<Itinerary, ModelOutputError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ModelOutputError::Empty);
    }

    let mut itinerary: Itinerary = serde_json::from_str(body)
        .map_err(|error| ModelOutputError::Malformed(error.to_string()))?;
    itinerary.normalize_day_labels();
    Ok(itinerary)
}

pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
