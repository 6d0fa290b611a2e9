//! The relation aggregator.
//!
//! Composes the window filter and sort engine across every candidate
//! collection relevant to one anchor, producing a uniform bundle for the
//! presentation layer. The portal fetches each collection independently and
//! asynchronously, so the aggregator is built to be re-invoked as
//! collections arrive: a collection that has not been supplied yet surfaces
//! as `Pending`, distinct from a computed-but-empty `Ready` result, and
//! every invocation recomputes from scratch.

use crate::config::RelationPolicy;
use crate::record::ClinicalRecord;
use crate::shared::unique_by_key;
use crate::sort::sorted;
use crate::window::filter_in_window;
use clinrel_types::RecordKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Candidate collections supplied to one aggregation call.
///
/// A kind that has not been inserted means "not yet loaded"; an inserted
/// empty vector means "loaded and known empty". The distinction flows
/// through to the bundle so the presentation layer can render skeletons for
/// pending panels and "no related records" for empty ones.
#[derive(Debug, Clone, Default)]
pub struct CandidateSets {
    collections: BTreeMap<RecordKind, Vec<ClinicalRecord>>,
}

impl CandidateSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, kind: RecordKind, records: Vec<ClinicalRecord>) -> Self {
        self.insert(kind, records);
        self
    }

    pub fn insert(&mut self, kind: RecordKind, records: Vec<ClinicalRecord>) {
        self.collections.insert(kind, records);
    }

    /// The loaded collection for `kind`, or `None` when it has not been
    /// supplied yet.
    pub fn get(&self, kind: RecordKind) -> Option<&[ClinicalRecord]> {
        self.collections.get(&kind).map(Vec::as_slice)
    }
}

/// The computed result for one relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RelatedRecords {
    /// The candidate collection has not been supplied yet.
    Pending,
    /// The relation was computed; `records` may be empty.
    Ready { records: Vec<ClinicalRecord> },
}

impl RelatedRecords {
    pub fn is_ready(&self) -> bool {
        matches!(self, RelatedRecords::Ready { .. })
    }

    /// The computed records, or `None` while pending.
    pub fn records(&self) -> Option<&[ClinicalRecord]> {
        match self {
            RelatedRecords::Pending => None,
            RelatedRecords::Ready { records } => Some(records),
        }
    }
}

/// Related records around one anchor, keyed by related kind.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(transparent)]
pub struct RelatedBundle {
    relations: BTreeMap<RecordKind, RelatedRecords>,
}

impl RelatedBundle {
    /// The result for one related kind, if the policy defines that relation
    /// for the anchor's kind.
    pub fn get(&self, kind: RecordKind) -> Option<&RelatedRecords> {
        self.relations.get(&kind)
    }

    /// Iterates the bundle in stable (kind) order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordKind, &RelatedRecords)> {
        self.relations.iter().map(|(kind, records)| (*kind, records))
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// Service computing related-record bundles.
///
/// Stateless beyond the policy it was constructed with; every call receives
/// fresh inputs and returns a fresh bundle.
#[derive(Debug, Clone)]
pub struct RelationService {
    policy: RelationPolicy,
}

impl RelationService {
    pub fn new(policy: RelationPolicy) -> Self {
        Self { policy }
    }

    /// A service using the built-in relation table.
    pub fn with_defaults() -> Self {
        Self::new(RelationPolicy::default())
    }

    pub fn policy(&self) -> &RelationPolicy {
        &self.policy
    }

    /// Computes the related-record bundle for one anchor.
    ///
    /// For each policy rule matching the anchor's kind: derive the window
    /// (an absent anchor date or a failed gate yields an empty result),
    /// filter the candidates, dedup by record id, and sort with the rule's
    /// strategy. Collections not present in `candidates` surface as
    /// `Pending`.
    pub fn related(&self, anchor: &ClinicalRecord, candidates: &CandidateSets) -> RelatedBundle {
        let mut relations = BTreeMap::new();

        for rule in self.policy.rules_for(anchor.kind) {
            let entry = match candidates.get(rule.related) {
                None => RelatedRecords::Pending,
                Some(records) => {
                    let matched = match rule.mode.window_for(anchor) {
                        Some(window) => {
                            tracing::debug!(
                                anchor_id = %anchor.id,
                                related = %rule.related,
                                window_start = %window.start,
                                window_end = ?window.end,
                                "computed relation window"
                            );
                            filter_in_window(records, &window, anchor.id)
                        }
                        None => Vec::new(),
                    };
                    let matched = unique_by_key(matched, |record| record.id);
                    RelatedRecords::Ready {
                        records: sorted(&matched, rule.sort),
                    }
                }
            };
            relations.insert(rule.related, entry);
        }

        RelatedBundle { relations }
    }
}

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
            start_date: Some(crate::dates::parse_iso_date(start).unwrap()),
            end_date: None,
            list_order: None,
            panel: None,
            extra: Map::new(),
        }
    }

    fn ranged(id: u128, kind: RecordKind, start: &str, end: &str) -> ClinicalRecord {
        ClinicalRecord {
            end_date: Some(crate::dates::parse_iso_date(end).unwrap()),
            ..record(id, kind, start)
        }
    }

    #[test]
    fn test_pending_vs_known_empty() {
        let service = RelationService::with_defaults();
        let anchor = record(1, RecordKind::Appointment, "2024-03-10");

        // Labs supplied (empty), medications not yet loaded.
        let candidates = CandidateSets::new().with(RecordKind::LabResult, Vec::new());
        let bundle = service.related(&anchor, &candidates);

        assert_eq!(
            bundle.get(RecordKind::LabResult),
            Some(&RelatedRecords::Ready { records: vec![] })
        );
        assert_eq!(
            bundle.get(RecordKind::Medication),
            Some(&RelatedRecords::Pending)
        );
        // No rule for appointment -> diagnosis, so no entry at all.
        assert_eq!(bundle.get(RecordKind::Diagnosis), None);
    }

    #[test]
    fn test_appointment_medication_symmetric_window() {
        let service = RelationService::with_defaults();
        let anchor = record(1, RecordKind::Appointment, "2024-03-10");

        let candidates = CandidateSets::new().with(
            RecordKind::Medication,
            vec![
                record(2, RecordKind::Medication, "2024-03-03"),
                record(3, RecordKind::Medication, "2024-03-17"),
                record(4, RecordKind::Medication, "2024-03-18"),
            ],
        );

        let bundle = service.related(&anchor, &candidates);
        let meds = bundle
            .get(RecordKind::Medication)
            .unwrap()
            .records()
            .unwrap();
        let ids: Vec<u128> = meds.iter().map(|r| r.id.as_u128()).collect();
        // Within 7 days either side; sorted most recent first (no list
        // orders set).
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_imaging_imaging_excludes_anchor_itself() {
        let service = RelationService::with_defaults();
        let anchor = record(1, RecordKind::Imaging, "2024-03-10");

        let candidates = CandidateSets::new().with(
            RecordKind::Imaging,
            vec![
                record(1, RecordKind::Imaging, "2024-03-10"),
                record(2, RecordKind::Imaging, "2024-04-01"),
            ],
        );

        let bundle = service.related(&anchor, &candidates);
        let imaging = bundle.get(RecordKind::Imaging).unwrap().records().unwrap();
        assert_eq!(imaging.len(), 1);
        assert_eq!(imaging[0].id, Uuid::from_u128(2));
    }

    #[test]
    fn test_medication_imaging_open_ended_without_end_date() {
        let service = RelationService::with_defaults();
        // Ongoing medication: no end date.
        let anchor = record(1, RecordKind::Medication, "2024-03-10");

        let candidates = CandidateSets::new().with(
            RecordKind::Imaging,
            vec![
                // Exactly 5 days before the start: lower bound holds.
                record(2, RecordKind::Imaging, "2024-03-05"),
                // 100 days after the start: no upper bound applies.
                record(3, RecordKind::Imaging, "2024-06-18"),
                // 6 days before the start: outside.
                record(4, RecordKind::Imaging, "2024-03-04"),
            ],
        );

        let bundle = service.related(&anchor, &candidates);
        let imaging = bundle.get(RecordKind::Imaging).unwrap().records().unwrap();
        let ids: Vec<u128> = imaging.iter().map(|r| r.id.as_u128()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_medication_lab_gate() {
        let service = RelationService::with_defaults();
        let labs = vec![record(9, RecordKind::LabResult, "2024-03-20")];

        // 10-day course: gate closed, labs relation computes empty.
        let short = ranged(1, RecordKind::Medication, "2024-03-01", "2024-03-11");
        let candidates = CandidateSets::new().with(RecordKind::LabResult, labs.clone());
        let bundle = service.related(&short, &candidates);
        assert_eq!(
            bundle.get(RecordKind::LabResult),
            Some(&RelatedRecords::Ready { records: vec![] })
        );

        // 30-day course: gate open, lab inside [start - 14, end + 14].
        let long = ranged(1, RecordKind::Medication, "2024-03-01", "2024-03-31");
        let bundle = service.related(&long, &candidates);
        let kept = bundle.get(RecordKind::LabResult).unwrap().records().unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_duplicate_candidates_are_deduped() {
        let service = RelationService::with_defaults();
        let anchor = record(1, RecordKind::Appointment, "2024-03-10");

        // The same lab reported by two institutions.
        let lab = record(2, RecordKind::LabResult, "2024-03-08");
        let candidates =
            CandidateSets::new().with(RecordKind::LabResult, vec![lab.clone(), lab.clone()]);

        let bundle = service.related(&anchor, &candidates);
        let labs = bundle.get(RecordKind::LabResult).unwrap().records().unwrap();
        assert_eq!(labs.len(), 1);
    }

    #[test]
    fn test_anchor_without_date_yields_empty_ready_results() {
        let service = RelationService::with_defaults();
        let anchor = ClinicalRecord {
            start_date: None,
            ..record(1, RecordKind::Appointment, "2024-03-10")
        };

        let candidates = CandidateSets::new().with(
            RecordKind::Imaging,
            vec![record(2, RecordKind::Imaging, "2024-03-10")],
        );

        let bundle = service.related(&anchor, &candidates);
        assert_eq!(
            bundle.get(RecordKind::Imaging),
            Some(&RelatedRecords::Ready { records: vec![] })
        );
    }

    #[test]
    fn test_repeated_aggregation_is_idempotent() {
        let service = RelationService::with_defaults();
        let anchor = ranged(1, RecordKind::Intervention, "2024-01-01", "2024-01-05");

        let candidates = CandidateSets::new()
            .with(
                RecordKind::Imaging,
                vec![
                    record(2, RecordKind::Imaging, "2023-10-03"),
                    record(3, RecordKind::Imaging, "2023-10-02"),
                    record(4, RecordKind::Imaging, "2024-01-19"),
                ],
            )
            .with(
                RecordKind::Medication,
                vec![record(5, RecordKind::Medication, "2024-01-10")],
            );

        let first = service.related(&anchor, &candidates);
        let second = service.related(&anchor, &candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bundle_serialises_keyed_by_kind() {
        let service = RelationService::with_defaults();
        let anchor = record(1, RecordKind::Appointment, "2024-03-10");
        let candidates = CandidateSets::new().with(RecordKind::LabResult, Vec::new());

        let bundle = service.related(&anchor, &candidates);
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["labResult"]["state"], "ready");
        assert_eq!(json["medication"]["state"], "pending");
    }
}
