use serde::{Deserialize, Serialize};

use crate::domain::itinerary::Itinerary;
use crate::identifier::GuideId;

/// Caller-facing result of a guide request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideEnvelope {
    pub tourist_guide_id: GuideId,
    pub guide_details: Itinerary,
}

pub fn assemble_response(id: GuideId, itinerary: Itinerary) -> GuideEnvelope {
    GuideEnvelope { tourist_guide_id: id, guide_details: itinerary }
}
