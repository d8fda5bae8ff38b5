//! Tourist guide identifiers.
//!
//! A guide id is 16 ASCII digits: the UTC ordinal date of generation (`YYDDD`)
//! followed by an 11-digit, zero-padded value taken from a shared sequence.
//! Uniqueness rests on the sequence source incrementing atomically.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATE_COMPONENT_LEN: usize = 5;
pub const SEQUENCE_DIGITS: usize = 11;
pub const GUIDE_ID_LEN: usize = DATE_COMPONENT_LEN + SEQUENCE_DIGITS;
pub const MAX_SEQUENCE_VALUE: u64 = 99_999_999_999;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuideId(String);

impl GuideId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date_component(&self) -> &str {
        &self.0[..DATE_COMPONENT_LEN]
    }

    pub fn sequence(&self) -> u64 {
        self.0[DATE_COMPONENT_LEN..].parse().unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == GUIDE_ID_LEN && raw.bytes().all(|byte| byte.is_ascii_digit());
        valid.then(|| Self(raw.to_string()))
    }
}

impl std::fmt::Display for GuideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("guide id must be 16 ASCII digits, got `{0}`")]
pub struct InvalidGuideId(pub String);

impl TryFrom<String> for GuideId {
    type Error = InvalidGuideId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or(InvalidGuideId(raw))
    }
}

impl From<GuideId> for String {
    fn from(id: GuideId) -> Self {
        id.0
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("sequence source unavailable: {0}")]
pub struct SequenceError(pub String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("sequence value {0} does not fit in 11 digits")]
    SequenceOverflow(u64),
}

/// Monotonic counter shared by every request that mints a guide id.
#[async_trait]
pub trait SequenceSource: Send + Sync {
    async fn next_value(&self) -> Result<u64, SequenceError>;
}

#[derive(Clone)]
pub struct IdentifierGenerator {
    source: Arc<dyn SequenceSource>,
}

impl IdentifierGenerator {
    pub fn new(source: Arc<dyn SequenceSource>) -> Self {
        Self { source }
    }

    pub async fn next_id(&self) -> Result<GuideId, GenerationError> {
        self.next_id_at(Utc::now()).await
    }

    pub async fn next_id_at(&self, now: DateTime<Utc>) -> Result<GuideId, GenerationError> {
        let value = self.source.next_value().await?;
        format_guide_id(now, value)
    }
}

pub fn format_guide_id(now: DateTime<Utc>, sequence: u64) -> Result<GuideId, GenerationError> {
    if sequence > MAX_SEQUENCE_VALUE {
        return Err(GenerationError::SequenceOverflow(sequence));
    }
    Ok(GuideId(format!("{}{sequence:0width$}", now.format("%y%j"), width = SEQUENCE_DIGITS)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::{
        format_guide_id, GenerationError, GuideId, IdentifierGenerator, SequenceError,
        SequenceSource, GUIDE_ID_LEN,
    };

    struct Counter(AtomicU64);

    #[async_trait]
    impl SequenceSource for Counter {
        async fn next_value(&self) -> Result<u64, SequenceError> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    struct Unreachable;

    #[async_trait]
    impl SequenceSource for Unreachable {
        async fn next_value(&self) -> Result<u64, SequenceError> {
            Err(SequenceError("connection refused".to_string()))
        }
    }

    #[test]
    fn id_combines_ordinal_date_and_padded_sequence() {
        let now = Utc.with_ymd_and_hms(2024, 2, 9, 15, 30, 0).single().expect("valid date");
        let id = format_guide_id(now, 42).expect("format id");

        assert_eq!(id.as_str(), "2404000000000042");
        assert_eq!(id.as_str().len(), GUIDE_ID_LEN);
        assert_eq!(id.date_component(), "24040");
        assert_eq!(id.sequence(), 42);
    }

    #[test]
    fn day_of_year_is_zero_padded_to_three_digits() {
        let now = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).single().expect("valid date");
        let id = format_guide_id(now, 7).expect("format id");

        assert_eq!(id.date_component(), "25003");
    }

    #[test]
    fn sequence_overflow_is_rejected() {
        let now = Utc::now();
        let error = format_guide_id(now, 100_000_000_000).expect_err("overflow");
        assert_eq!(error, GenerationError::SequenceOverflow(100_000_000_000));
    }

    #[tokio::test]
    async fn consecutive_ids_on_same_day_differ_only_in_suffix() {
        let generator = IdentifierGenerator::new(Arc::new(Counter(AtomicU64::new(99))));
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).single().expect("valid date");

        let first = generator.next_id_at(now).await.expect("first id");
        let second = generator.next_id_at(now).await.expect("second id");

        assert_eq!(first.date_component(), second.date_component());
        assert_eq!(first.date_component(), "24366");
        assert_eq!(first.sequence(), 100);
        assert_eq!(second.sequence(), 101);
        assert!(second.sequence() > first.sequence());
        assert!(second > first);
    }

    #[tokio::test]
    async fn unreachable_source_surfaces_generation_error() {
        let generator = IdentifierGenerator::new(Arc::new(Unreachable));

        let error = generator.next_id().await.expect_err("source is down");
        assert!(matches!(error, GenerationError::Sequence(_)));
    }

    #[test]
    fn parse_accepts_only_sixteen_digits() {
        assert!(GuideId::parse("2404000000000042").is_some());
        assert!(GuideId::parse("24040000000042").is_none());
        assert!(GuideId::parse("24040abc00000042").is_none());
    }

    #[test]
    fn deserialized_ids_are_validated_like_parsed_ones() {
        let id: GuideId = serde_json::from_str("\"2404000000000042\"").expect("valid id");
        assert_eq!(id.sequence(), 42);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"2404000000000042\"");

        for raw in ["\"\"", "\"2404\"", "\"24040abc00000042\"", "\"24040000000000420\""] {
            let error = serde_json::from_str::<GuideId>(raw).expect_err("malformed id");
            assert!(error.to_string().contains("16 ASCII digits"), "{raw}: {error}");
        }
    }
}
