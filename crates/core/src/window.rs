//! Temporal window filtering.
//!
//! A window is the inclusive calendar interval around an anchor record that
//! decides which candidate records count as "related". Windows are derived
//! values: recomputed for every query, never stored.
//!
//! Filtering never reorders. The output preserves the candidates' relative
//! order so that sorting stays an explicit, separate step.

use crate::dates::{add_days, days_between};
use crate::record::ClinicalRecord;
use chrono::NaiveDate;
use clinrel_types::DaySpan;
use uuid::Uuid;

/// An inclusive calendar-date interval.
///
/// `end: None` means the interval has no upper bound (used when an
/// open-ended relation has no closing date to anchor on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl Window {
    /// A closed interval `[start, end]`.
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// An interval `[start, ∞)` with no upper bound.
    pub fn open_ended(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// The symmetric interval `[centre − days, centre + days]`.
    pub fn around_point(centre: NaiveDate, days: DaySpan) -> Self {
        Self::closed(
            add_days(centre, -days.days()),
            add_days(centre, days.days()),
        )
    }

    /// The asymmetric interval around an anchor's date range.
    ///
    /// Computes `[anchor.start − before, end + after]` where `end` is the
    /// anchor's end date, falling back to its start date for single-day
    /// anchors. Returns `None` when the anchor has no usable start date.
    pub fn around_anchor(anchor: &ClinicalRecord, before: DaySpan, after: DaySpan) -> Option<Self> {
        let start = anchor.start_date?;
        let end = anchor.effective_end().unwrap_or(start);
        Some(Self::closed(
            add_days(start, -before.days()),
            add_days(end, after.days()),
        ))
    }

    /// Whether `date` falls inside the interval, bounds inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }
}

/// Keeps the candidates whose start date falls inside `window`.
///
/// Candidates without a parseable start date are excluded, as is any
/// candidate sharing the anchor's id (`exclude`). The result is a fresh
/// vector in the candidates' original relative order.
pub fn filter_in_window(
    candidates: &[ClinicalRecord],
    window: &Window,
    exclude: Uuid,
) -> Vec<ClinicalRecord> {
    candidates
        .iter()
        .filter(|c| c.id != exclude)
        .filter(|c| c.start_date.is_some_and(|d| window.contains(d)))
        .cloned()
        .collect()
}

/// Symmetric single-date mode: keeps candidates within `days` whole days of
/// the anchor's start date, in either direction, boundary inclusive.
///
/// An anchor without a valid start date yields an empty result. The anchor's
/// own id is always excluded.
pub fn filter_within_interval(
    candidates: &[ClinicalRecord],
    anchor: &ClinicalRecord,
    days: DaySpan,
) -> Vec<ClinicalRecord> {
    let Some(anchor_start) = anchor.start_date else {
        return Vec::new();
    };

    candidates
        .iter()
        .filter(|c| c.id != anchor.id)
        .filter(|c| {
            c.start_date
                .is_some_and(|d| days_between(anchor_start, d).abs() <= days.days())
        })
        .cloned()
        .collect()
}

/// Asymmetric range mode: keeps candidates whose start date falls within
/// `[anchor.start − before, (anchor.end ?? anchor.start) + after]`.
///
/// An anchor without a valid start date yields an empty result. The anchor's
/// own id is always excluded.
pub fn filter_within_range(
    candidates: &[ClinicalRecord],
    anchor: &ClinicalRecord,
    before: DaySpan,
    after: DaySpan,
) -> Vec<ClinicalRecord> {
    match Window::around_anchor(anchor, before, after) {
        Some(window) => filter_in_window(candidates, &window, anchor.id),
        None => Vec::new(),
    }
}
