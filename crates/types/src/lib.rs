//! Shared domain primitives for the clinrel workspace.
//!
//! These are small validated types used across the relation engine and its
//! callers: the clinical record kinds and statuses the portal exchanges, and
//! a non-negative day-span type for relevance-window offsets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating a validated day span.
#[derive(Debug, thiserror::Error)]
pub enum SpanError {
    /// The input was a negative number of days
    #[error("day span cannot be negative, got {0}")]
    Negative(i64),
    /// The input exceeded the supported range
    #[error("day span {0} exceeds the supported range")]
    TooLarge(i64),
}

/// A whole-day count that is guaranteed non-negative.
///
/// Window offsets ("30 days before", "14 days after") are always directions
/// applied to an anchor date, so the count itself must not be negative. The
/// serde implementation enforces the invariant on the wire: deserialising a
/// negative number fails with a clear message, so a bad policy file is
/// rejected at load time rather than producing an inverted window mid-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DaySpan(u32);

impl DaySpan {
    /// Creates a new `DaySpan` from a signed day count.
    ///
    /// # Errors
    ///
    /// Returns `SpanError::Negative` for negative input, or
    /// `SpanError::TooLarge` if the count does not fit the supported range.
    pub fn new(days: i64) -> Result<Self, SpanError> {
        if days < 0 {
            return Err(SpanError::Negative(days));
        }
        u32::try_from(days)
            .map(Self)
            .map_err(|_| SpanError::TooLarge(days))
    }

    /// Returns the span as a signed whole-day count.
    pub fn days(self) -> i64 {
        i64::from(self.0)
    }
}

impl From<u32> for DaySpan {
    fn from(days: u32) -> Self {
        Self(days)
    }
}

impl fmt::Display for DaySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for DaySpan {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(u64::from(self.0))
    }
}

impl<'de> Deserialize<'de> for DaySpan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SpanVisitor;

        impl serde::de::Visitor<'_> for SpanVisitor {
            type Value = DaySpan;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative whole number of days")
            }

            fn visit_i64<E>(self, value: i64) -> Result<DaySpan, E>
            where
                E: serde::de::Error,
            {
                DaySpan::new(value).map_err(E::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<DaySpan, E>
            where
                E: serde::de::Error,
            {
                let value = i64::try_from(value)
                    .map_err(|_| E::custom(SpanError::TooLarge(i64::MAX)))?;
                DaySpan::new(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_i64(SpanVisitor)
    }
}

/// Errors that can occur when parsing a record kind from text.
#[derive(Debug, thiserror::Error)]
pub enum KindError {
    /// The input did not name a known record kind
    #[error("unrecognised record kind '{0}'")]
    Unrecognised(String),
}

/// The kinds of clinical record the portal exchanges.
///
/// Every collection handled by the relation engine is homogeneous in kind;
/// the kind of the anchor selects which relation rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Imaging,
    Medication,
    Intervention,
    LabResult,
    Appointment,
    Attachment,
    TimelineEvent,
    Diagnosis,
}

impl RecordKind {
    /// Canonical lowercase name, used for display and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Imaging => "imaging",
            RecordKind::Medication => "medication",
            RecordKind::Intervention => "intervention",
            RecordKind::LabResult => "lab-result",
            RecordKind::Appointment => "appointment",
            RecordKind::Attachment => "attachment",
            RecordKind::TimelineEvent => "timeline-event",
            RecordKind::Diagnosis => "diagnosis",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = KindError;

    /// Parses a record kind from user-facing text.
    ///
    /// Accepts the canonical name in any casing, with or without separator
    /// characters, so `lab-result`, `labResult` and `lab_result` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match folded.as_str() {
            "imaging" => Ok(RecordKind::Imaging),
            "medication" => Ok(RecordKind::Medication),
            "intervention" => Ok(RecordKind::Intervention),
            "labresult" | "lab" => Ok(RecordKind::LabResult),
            "appointment" => Ok(RecordKind::Appointment),
            "attachment" => Ok(RecordKind::Attachment),
            "timelineevent" => Ok(RecordKind::TimelineEvent),
            "diagnosis" => Ok(RecordKind::Diagnosis),
            _ => Err(KindError::Unrecognised(s.to_string())),
        }
    }
}

/// Lifecycle status of a clinical record.
///
/// The portal sends free-text statuses; anything unrecognised maps to
/// `Unknown` rather than failing the record, since status only influences
/// display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Record is active and ongoing.
    Active,
    /// Record ran to completion.
    Completed,
    /// Record was stopped before completion.
    Discontinued,
    /// Status not recognised.
    Unknown,
}

impl RecordStatus {
    /// Maps wire text onto a status. Matching is case-insensitive and
    /// never fails; unrecognised text becomes `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => RecordStatus::Active,
            "completed" => RecordStatus::Completed,
            "discontinued" | "stopped" => RecordStatus::Discontinued,
            _ => RecordStatus::Unknown,
        }
    }

    /// Returns `true` for statuses that should sort ahead of inactive ones.
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }
}

impl<'de> Deserialize<'de> for RecordStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(RecordStatus::from_wire(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_span_rejects_negative() {
        let err = DaySpan::new(-1).unwrap_err();
        assert!(matches!(err, SpanError::Negative(-1)));
    }

    #[test]
    fn test_day_span_accepts_zero() {
        let span = DaySpan::new(0).unwrap();
        assert_eq!(span.days(), 0);
    }

    #[test]
    fn test_day_span_deserialises_from_number() {
        let span: DaySpan = serde_json::from_str("30").unwrap();
        assert_eq!(span, DaySpan::from(30));
    }

    #[test]
    fn test_day_span_deserialise_rejects_negative() {
        let result: Result<DaySpan, _> = serde_json::from_str("-7");
        assert!(result.is_err());
    }

    #[test]
    fn test_day_span_serialises_as_number() {
        let json = serde_json::to_string(&DaySpan::from(14)).unwrap();
        assert_eq!(json, "14");
    }

    #[test]
    fn test_record_kind_parse_variants() {
        assert_eq!("imaging".parse::<RecordKind>().unwrap(), RecordKind::Imaging);
        assert_eq!(
            "lab-result".parse::<RecordKind>().unwrap(),
            RecordKind::LabResult
        );
        assert_eq!(
            "labResult".parse::<RecordKind>().unwrap(),
            RecordKind::LabResult
        );
        assert_eq!(
            "TIMELINE_EVENT".parse::<RecordKind>().unwrap(),
            RecordKind::TimelineEvent
        );
    }

    #[test]
    fn test_record_kind_parse_unknown_fails() {
        let err = "prescriptions".parse::<RecordKind>().unwrap_err();
        assert!(err.to_string().contains("prescriptions"));
    }

    #[test]
    fn test_record_kind_wire_form_is_camel_case() {
        let json = serde_json::to_string(&RecordKind::LabResult).unwrap();
        assert_eq!(json, "\"labResult\"");
    }

    #[test]
    fn test_record_status_stopped_alias() {
        let status: RecordStatus = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(status, RecordStatus::Discontinued);
    }

    #[test]
    fn test_record_status_unknown_catch_all() {
        let status: RecordStatus = serde_json::from_str("\"on-hold\"").unwrap();
        assert_eq!(status, RecordStatus::Unknown);
        assert!(!status.is_active());
    }

    #[test]
    fn test_record_status_active() {
        let status: RecordStatus = serde_json::from_str("\"active\"").unwrap();
        assert!(status.is_active());
    }
}
