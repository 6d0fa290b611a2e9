//! # clinrel core
//!
//! Temporal-proximity relation engine for patient-record portals.
//!
//! Given collections of clinical records (imaging, medications,
//! interventions, lab results, appointments, attachments) and one anchor
//! record, the engine selects the records temporally close to the anchor
//! and orders them for display:
//! - date utilities ([`dates`]) for calendar-day arithmetic
//! - window filtering ([`window`]) with symmetric and asymmetric modes
//! - composite display ordering ([`sort`])
//! - a declarative per-relation offset policy ([`config`])
//! - the aggregator ([`relations`]) tying them together per anchor
//!
//! The engine is pure and synchronous: every call receives materialised
//! inputs, mutates nothing, and returns a fresh result. Fetching, caching,
//! authentication and rendering belong to the callers.

pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod record;
pub mod relations;
pub mod shared;
pub mod sort;
pub mod validation;
pub mod window;

pub use config::{RelationPolicy, RelationRule, WindowMode};
pub use error::{RelationError, RelationResult};
pub use record::{
    record_from_json, records_from_inputs, records_from_json, ClinicalRecord, RecordInput,
};
pub use relations::{CandidateSets, RelatedBundle, RelatedRecords, RelationService};
pub use shared::unique_by_key;
pub use sort::{
    sort_by_date_and_panel, sort_by_date_desc, sort_by_list_order_and_date,
    sort_by_list_order_and_status, sorted, SortStrategy,
};
pub use window::{filter_within_interval, filter_within_range, Window};

// Re-export the shared primitive types so callers need only this crate.
pub use clinrel_types::{DaySpan, KindError, RecordKind, RecordStatus, SpanError};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use uuid::Uuid;

    fn record(id: u128, kind: RecordKind, start: &str) -> ClinicalRecord {
        ClinicalRecord {
            id: Uuid::from_u128(id),
            kind,
            title: None,
            status: None,
            start_date: Some(dates::parse_iso_date(start).unwrap()),
            end_date: None,
            list_order: None,
            panel: None,
            extra: Map::new(),
        }
    }

    // The full pipeline (filter then sort) applied twice to the same inputs
    // must leave the inputs untouched and produce deep-equal outputs.
    #[test]
    fn test_filter_sort_pipeline_is_pure_and_idempotent() {
        let anchor = record(1, RecordKind::Appointment, "2024-03-10");
        let candidates = vec![
            record(2, RecordKind::Medication, "2024-03-17"),
            record(3, RecordKind::Medication, "2024-03-03"),
            record(4, RecordKind::Medication, "2024-05-01"),
        ];
        let snapshot = candidates.clone();

        let run = || {
            let kept = filter_within_interval(&candidates, &anchor, DaySpan::from(7));
            sorted(&kept, SortStrategy::DateDesc)
        };

        let first = run();
        let second = run();

        assert_eq!(first, second);
        assert_eq!(candidates, snapshot);
        let ids: Vec<u128> = first.iter().map(|r| r.id.as_u128()).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
