//! Display ordering for clinical record collections.
//!
//! Every function here returns a freshly allocated, sorted vector and leaves
//! its input untouched. The portal's original code sorted shared array
//! references in place, which leaked reordering into unrelated views; making
//! "sort" a pure transform removes that class of bug by construction.
//!
//! All sorts are stable: records with fully-equal keys keep their original
//! relative order.

use crate::record::ClinicalRecord;
use chrono::NaiveDate;
use clinrel_types::RecordStatus;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Named sort strategies, used by the relation policy to pick an ordering
/// per relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortStrategy {
    /// Start date descending, most recent first.
    #[default]
    DateDesc,
    /// Start date descending, panel name ascending for same-date clustering.
    DateThenPanel,
    /// Explicit list order ascending (absent last), then date descending.
    ListOrderThenDate,
    /// Explicit list order ascending (absent last), then active status
    /// first, then date descending.
    ListOrderThenStatus,
}

/// Sorts `records` with the given strategy into a new vector.
pub fn sorted(records: &[ClinicalRecord], strategy: SortStrategy) -> Vec<ClinicalRecord> {
    match strategy {
        SortStrategy::DateDesc => sort_by_date_desc(records),
        SortStrategy::DateThenPanel => sort_by_date_and_panel(records),
        SortStrategy::ListOrderThenDate => sort_by_list_order_and_date(records),
        SortStrategy::ListOrderThenStatus => sort_by_list_order_and_status(records),
    }
}

/// Start date descending; records without a date rank last.
pub fn sort_by_date_desc(records: &[ClinicalRecord]) -> Vec<ClinicalRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| cmp_date_desc(a.start_date, b.start_date));
    out
}

/// Start date descending as the dominant key, then panel name ascending
/// (case-sensitive) so same-date records cluster by panel. Records without
/// a panel sort after named panels on equal dates.
pub fn sort_by_date_and_panel(records: &[ClinicalRecord]) -> Vec<ClinicalRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| {
        cmp_date_desc(a.start_date, b.start_date)
            .then_with(|| cmp_panel(a.panel.as_deref(), b.panel.as_deref()))
    });
    out
}

/// Explicit list order ascending with absent orders last; ties (both orders
/// absent, or equal) break by start date descending.
pub fn sort_by_list_order_and_date(records: &[ClinicalRecord]) -> Vec<ClinicalRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| {
        cmp_list_order(a.list_order, b.list_order)
            .then_with(|| cmp_date_desc(a.start_date, b.start_date))
    });
    out
}

/// Explicit list order ascending with absent orders last; ties break by
/// active status first, then start date descending.
pub fn sort_by_list_order_and_status(records: &[ClinicalRecord]) -> Vec<ClinicalRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| {
        cmp_list_order(a.list_order, b.list_order)
            .then_with(|| cmp_status_active_first(a.status, b.status))
            .then_with(|| cmp_date_desc(a.start_date, b.start_date))
    });
    out
}

/// Descending date order with `None` after every `Some`.
fn cmp_date_desc(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => b.cmp(&a),
    }
}

/// Ascending list order with `None` after every `Some`.
fn cmp_list_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

/// Ascending panel name with `None` after every `Some`. Case-sensitive.
fn cmp_panel(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// Active statuses before everything else; unknown/absent count as inactive.
fn cmp_status_active_first(a: Option<RecordStatus>, b: Option<RecordStatus>) -> Ordering {
    let a_active = a.map_or(false, |s| s.is_active());
    let b_active = b.map_or(false, |s| s.is_active());
    b_active.cmp(&a_active)
}
