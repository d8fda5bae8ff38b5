use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

pub const GUIDE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Incoming `POST /generate-guide` body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    pub country: String,
    pub city: String,
    pub group: String,
    pub participants: BTreeMap<String, Value>,
    pub activities: Vec<String>,
    pub start_datetime: String,
    pub end_datetime: String,
}

/// A guide request whose fields have been checked and normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct GuideQuery {
    pub client_id: Option<String>,
    pub country: String,
    pub city: String,
    pub group: String,
    pub participants: Vec<(String, String)>,
    pub activities: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl GuideRequest {
    pub fn validate(&self) -> Result<GuideQuery, DomainError> {
        let start = parse_datetime("startDatetime", &self.start_datetime)?;
        let end = parse_datetime("endDatetime", &self.end_datetime)?;
        if end < start {
            return Err(DomainError::Validation(format!(
                "endDatetime `{}` is earlier than startDatetime `{}`",
                self.end_datetime, self.start_datetime
            )));
        }

        let country = required("country", &self.country)?;
        let city = required("city", &self.city)?;

        let participants = self
            .participants
            .iter()
            .map(|(key, value)| (key.clone(), render_participant(value)))
            .collect();

        let activities = self
            .activities
            .iter()
            .map(|activity| activity.trim())
            .filter(|activity| !activity.is_empty())
            .map(str::to_string)
            .collect();

        Ok(GuideQuery {
            client_id: self
                .client_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            country,
            city,
            group: self.group.trim().to_string(),
            participants,
            activities,
            start,
            end,
        })
    }
}

impl GuideQuery {
    pub fn participants_text(&self) -> String {
        self.participants
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn activities_text(&self) -> String {
        self.activities.join(", ")
    }

    pub fn start_text(&self) -> String {
        self.start.format(GUIDE_DATETIME_FORMAT).to_string()
    }

    pub fn end_text(&self) -> String {
        self.end.format(GUIDE_DATETIME_FORMAT).to_string()
    }
}

fn parse_datetime(field: &str, raw: &str) -> Result<NaiveDateTime, DomainError> {
    NaiveDateTime::parse_from_str(raw.trim(), GUIDE_DATETIME_FORMAT).map_err(|error| {
        DomainError::Validation(format!(
            "invalid date format for {field}: use 'YYYY-MM-DD HH:MM:SS' ({error})"
        ))
    })
}

fn required(field: &str, raw: &str) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn render_participant(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
