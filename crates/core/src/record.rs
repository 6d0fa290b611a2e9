//! Clinical record wire and domain models.
//!
//! The portal API delivers records as camelCase JSON with `YYYY-MM-DD` date
//! strings and a long tail of domain fields (notes, linked providers,
//! institutions) the relation engine never inspects. This module is the
//! boundary between that wire shape and the typed domain model the engine
//! computes over: dates are parsed once here, and everything downstream
//! works with `chrono::NaiveDate`.
//!
//! Parsing is deliberately lenient. A record with a malformed start date is
//! kept (it can still render in a plain list) but carries no date, which
//! excludes it from window results. An inverted range is normalised so the
//! rest of the engine can rely on `end_date >= start_date`. Both cases are
//! logged as warnings with the record id.

use crate::dates::parse_iso_date;
use crate::RelationResult;
use chrono::NaiveDate;
use clinrel_types::{RecordKind, RecordStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Wire model
// ============================================================================

/// A clinical record as received from the portal API.
///
/// Only the fields the relation engine reads are named; everything else the
/// API sends is captured in `extra` and carried through untouched, so the
/// presentation layer receives the same shape it sent in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    /// Unique record identifier.
    pub id: Uuid,

    /// Record kind, when the payload carries one. Collections are
    /// homogeneous, so the caller normally supplies the kind instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,

    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,

    /// Calendar date the record starts, as an ISO `YYYY-MM-DD` string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Calendar date the record ends, when it spans a range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Explicit display position within its list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_order: Option<i64>,

    /// Panel/category name (lab results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,

    /// Passthrough of every other field the API sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Domain model
// ============================================================================

/// A clinical record with parsed dates, ready for window and sort operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    /// `None` when the wire date was absent or unparseable; such records are
    /// excluded from window results and rank last in date sorts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClinicalRecord {
    /// Converts a wire record into the domain model.
    ///
    /// This never fails: malformed dates parse to `None` with a warning, and
    /// an inverted range (`endDate < startDate`) is normalised by swapping
    /// the two dates, also with a warning. A `kind` carried by the payload
    /// takes precedence over the collection-supplied one.
    pub fn from_input(kind: RecordKind, input: RecordInput) -> Self {
        let id = input.id;
        let start_date = parse_wire_date(id, "startDate", input.start_date.as_deref());
        let end_date = parse_wire_date(id, "endDate", input.end_date.as_deref());

        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) if end < start => {
                tracing::warn!(
                    record_id = %id,
                    "record has endDate before startDate; swapping to normalise"
                );
                (Some(end), Some(start))
            }
            dates => dates,
        };

        Self {
            id,
            kind: input.kind.unwrap_or(kind),
            title: input.title,
            status: input.status,
            start_date,
            end_date,
            list_order: input.list_order,
            panel: input.panel,
            extra: input.extra,
        }
    }

    /// The date closing the record's range: `end_date`, falling back to
    /// `start_date` when the record spans a single day.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.end_date.or(self.start_date)
    }

    /// Whole days covered by the record's range, when both dates are known.
    pub fn span_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(crate::dates::days_between(start, end)),
            _ => None,
        }
    }
}

fn parse_wire_date(id: Uuid, field: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = value?;
    match parse_iso_date(value) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(record_id = %id, field, %err, "ignoring unparseable date");
            None
        }
    }
}

/// Converts a collection of wire records, preserving order.
pub fn records_from_inputs(kind: RecordKind, inputs: Vec<RecordInput>) -> Vec<ClinicalRecord> {
    inputs
        .into_iter()
        .map(|input| ClinicalRecord::from_input(kind, input))
        .collect()
}

/// Parses a JSON array of wire records into domain records.
///
/// Individual elements that fail to deserialise are skipped with a warning
/// rather than aborting the whole collection.
///
/// # Errors
///
/// Returns `RelationError::RecordParse` only when the payload itself is not
/// a JSON array.
pub fn records_from_json(kind: RecordKind, json: &str) -> RelationResult<Vec<ClinicalRecord>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;

    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<RecordInput>(value) {
            Ok(input) => records.push(ClinicalRecord::from_input(kind, input)),
            Err(err) => {
                tracing::warn!(%err, "skipping record that failed to deserialise");
            }
        }
    }

    Ok(records)
}

/// Parses a single wire record from JSON.
///
/// # Errors
///
/// Returns `RelationError::RecordParse` if the payload is not a record
/// object.
pub fn record_from_json(kind: RecordKind, json: &str) -> RelationResult<ClinicalRecord> {
    let input: RecordInput = serde_json::from_str(json)?;
    Ok(ClinicalRecord::from_input(kind, input))
}
