use serde::{Deserialize, Serialize};

use crate::domain::activity::{ActivityId, ActivityImages, ActivityRecord, Coordinates};

/// Attributes copied from the canonical activity onto an itinerary entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "reviewsCount")]
    pub reviews_count: i64,
    pub estimated_time: String,
    pub description: String,
    pub coordinates: Coordinates,
    pub opening_hours: String,
    #[serde(rename = "s3Images")]
    pub images: ActivityImages,
}

impl From<&ActivityRecord> for ActivityDetails {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            total_score: record.total_score,
            reviews_count: record.reviews_count,
            estimated_time: record.estimated_time.clone(),
            description: record.description.clone(),
            coordinates: record.coordinates,
            opening_hours: record.opening_hours.clone(),
            images: record.images.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<ActivityId>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub details: Option<ActivityDetails>,
}

impl ActivityEntry {
    pub fn new(principal_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { principal_id: Some(ActivityId(principal_id.into())), name: name.into(), details: None }
    }

    pub fn is_enriched(&self) -> bool {
        self.details.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// 0 until labelled; see [`Itinerary::normalize_day_labels`].
    #[serde(default, deserialize_with = "day_label")]
    pub day: u32,
    pub activities: Vec<ActivityEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDayLabel {
    Number(u32),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Models label days as `1`, `"1"` or free text such as `"Día 1"`. Anything
/// that is not a day number reads as unlabelled.
fn day_label<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(match RawDayLabel::deserialize(deserializer)? {
        RawDayLabel::Number(day) => day,
        RawDayLabel::Text(text) => text.trim().parse().unwrap_or(0),
        RawDayLabel::Other(_) => 0,
    })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(rename = "itinerary")]
    pub days: Vec<ItineraryDay>,
}

impl Itinerary {
    pub fn new(days: Vec<ItineraryDay>) -> Self {
        Self { days }
    }

    /// Ids referenced by the itinerary, in day/entry order, duplicates kept.
    /// Entries without an id are skipped.
    pub fn principal_ids(&self) -> Vec<ActivityId> {
        self.days
            .iter()
            .flat_map(|day| day.activities.iter())
            .filter_map(|entry| entry.principal_id.clone())
            .collect()
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|day| day.activities.len()).sum()
    }

    /// Assigns 1-based labels to days the model left unnumbered.
    pub fn normalize_day_labels(&mut self) {
        for (index, day) in self.days.iter_mut().enumerate() {
            if day.day == 0 {
                day.day = u32::try_from(index + 1).unwrap_or(u32::MAX);
            }
        }
    }
}
