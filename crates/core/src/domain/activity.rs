use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActivityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityImages {
    #[serde(rename = "s3MainImageUrl")]
    pub main: String,
    #[serde(rename = "s3DetailImageUrl")]
    pub detail: String,
    #[serde(rename = "s3ExpandImageUrl")]
    pub expanded: String,
}

/// Canonical activity as served to callers. Every attribute is populated;
/// absent source values have already been replaced by their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub principal_id: ActivityId,
    pub destination_id: String,
    pub city: String,
    pub country_code: String,
    pub name: String,
    pub description: String,
    pub currency: String,
    #[serde(with = "fee")]
    pub full_fee: Decimal,
    #[serde(with = "fee")]
    pub reduced_fee: Decimal,
    pub coordinates: Coordinates,
    pub total_score: f64,
    pub reviews_count: i64,
    #[serde(rename = "estimated_time")]
    pub estimated_time: String,
    #[serde(rename = "opening_hours")]
    pub opening_hours: String,
    #[serde(rename = "s3Images")]
    pub images: ActivityImages,
}

/// A distinct destination present in the activity catalog.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub destination_id: String,
    pub city: Option<String>,
    pub country_code: String,
}

/// Raw activity document as held by the activity store. Any attribute other
/// than the key may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityDocument {
    pub principal_id: ActivityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduced_fee: Option<Decimal>,
    #[serde(rename = "location_lat", skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<f64>,
    #[serde(rename = "location_lng", skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<i64>,
    #[serde(rename = "estimated_time", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(rename = "opening_hours", skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_images: Option<ImageDocument>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDocument {
    #[serde(rename = "s3MainImageUrl", skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(rename = "s3DetailImageUrl", skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "s3ExpandImageUrl", skip_serializing_if = "Option::is_none")]
    pub expanded: Option<String>,
}

impl From<ImageDocument> for ActivityImages {
    fn from(document: ImageDocument) -> Self {
        Self {
            main: document.main.unwrap_or_default(),
            detail: document.detail.unwrap_or_default(),
            expanded: document.expanded.unwrap_or_default(),
        }
    }
}

impl From<ActivityDocument> for ActivityRecord {
    fn from(document: ActivityDocument) -> Self {
        Self {
            principal_id: document.principal_id,
            destination_id: document.destination_id.unwrap_or_default(),
            city: document.city.unwrap_or_default(),
            country_code: document.country_code.unwrap_or_default(),
            name: document.name.unwrap_or_default(),
            description: document.description.unwrap_or_default(),
            currency: document.currency.unwrap_or_default(),
            full_fee: document.full_fee.unwrap_or(Decimal::ZERO),
            reduced_fee: document.reduced_fee.unwrap_or(Decimal::ZERO),
            coordinates: Coordinates {
                latitude: document.location_lat.unwrap_or(0.0),
                longitude: document.location_lng.unwrap_or(0.0),
            },
            total_score: document.total_score.unwrap_or(0.0),
            reviews_count: document.reviews_count.unwrap_or(0),
            estimated_time: document.estimated_time.unwrap_or_default(),
            opening_hours: document.opening_hours.unwrap_or_default(),
            images: document.s3_images.unwrap_or_default().into(),
        }
    }
}

/// Entrance fees travel as fixed two-decimal strings.
mod fee {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.2}", value.round_dp(2)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}
