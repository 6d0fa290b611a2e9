//! Relation policy configuration.
//!
//! The per-relation day offsets are the engine's only business knowledge:
//! they encode which records count as clinically relevant around an anchor,
//! and changing them silently changes what clinicians see. They live here as
//! one declarative table rather than scattered constants, and a deployment
//! can override the table with a YAML file.
//!
//! A policy is resolved once at process startup and handed to
//! `RelationService`; nothing reads files or environment variables during
//! query handling.

use crate::record::ClinicalRecord;
use crate::sort::SortStrategy;
use crate::validation::validate_policy;
use crate::window::Window;
use crate::{RelationError, RelationResult};
use clinrel_types::{DaySpan, RecordKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a relation's window is derived from its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WindowMode {
    /// `[start − days, start + days]` around the anchor's start date.
    Symmetric { days: DaySpan },
    /// `[start − before, (end ?? start) + after]`.
    Range { before: DaySpan, after: DaySpan },
    /// `[start − before, end + after]`, with no upper bound when the anchor
    /// has no end date (lower bound only).
    RangeOpenEnded { before: DaySpan, after: DaySpan },
    /// As `Range`, but only when the anchor's own span exceeds
    /// `minSpanDays`; otherwise the relation yields nothing. An anchor
    /// without an end date fails the gate.
    RangeGated {
        before: DaySpan,
        after: DaySpan,
        min_span_days: DaySpan,
    },
}

impl WindowMode {
    /// Computes the window this mode produces for `anchor`.
    ///
    /// Returns `None` when no window applies: the anchor has no usable
    /// start date, or a gated mode's precondition fails.
    pub fn window_for(&self, anchor: &ClinicalRecord) -> Option<Window> {
        let start = anchor.start_date?;
        match *self {
            WindowMode::Symmetric { days } => Some(Window::around_point(start, days)),
            WindowMode::Range { before, after } => Window::around_anchor(anchor, before, after),
            WindowMode::RangeOpenEnded { before, after } => {
                let lower = crate::dates::add_days(start, -before.days());
                Some(match anchor.end_date {
                    Some(end) => {
                        Window::closed(lower, crate::dates::add_days(end, after.days()))
                    }
                    None => Window::open_ended(lower),
                })
            }
            WindowMode::RangeGated {
                before,
                after,
                min_span_days,
            } => {
                let span = anchor.span_days()?;
                if span <= min_span_days.days() {
                    return None;
                }
                Window::around_anchor(anchor, before, after)
            }
        }
    }
}

/// One relation: which records to pull in around anchors of a given kind,
/// and how to order them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRule {
    /// Kind of the anchor record this rule applies to.
    pub anchor: RecordKind,
    /// Kind of the related candidates.
    pub related: RecordKind,
    /// Window derivation for this relation.
    #[serde(flatten)]
    pub mode: WindowMode,
    /// Display ordering for the matches.
    #[serde(default)]
    pub sort: SortStrategy,
}

/// The full set of relation rules, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationPolicy {
    rules: Vec<RelationRule>,
}

impl RelationPolicy {
    /// Creates a policy from explicit rules, validating them first.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::InvalidInput` if the rule set is empty or
    /// contains duplicate `(anchor, related)` pairs.
    pub fn new(rules: Vec<RelationRule>) -> RelationResult<Self> {
        let policy = Self { rules };
        validate_policy(&policy)?;
        Ok(policy)
    }

    /// All rules, in declaration order.
    pub fn rules(&self) -> &[RelationRule] {
        &self.rules
    }

    /// The rules applying to anchors of `kind`.
    pub fn rules_for(&self, kind: RecordKind) -> impl Iterator<Item = &RelationRule> {
        self.rules.iter().filter(move |rule| rule.anchor == kind)
    }

    /// Loads a policy override from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::PolicyParse` for malformed YAML (including
    /// negative day offsets) and `RelationError::InvalidInput` for a rule
    /// set that fails validation.
    pub fn from_yaml_str(yaml: &str) -> RelationResult<Self> {
        let policy: Self = serde_yaml::from_str(yaml)?;
        validate_policy(&policy)?;
        Ok(policy)
    }

    /// Loads a policy override from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::PolicyRead` if the file cannot be read, plus
    /// everything `from_yaml_str` can return.
    pub fn from_yaml_file(path: &Path) -> RelationResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(RelationError::PolicyRead)?;
        Self::from_yaml_str(&yaml)
    }

    /// Renders the policy as YAML, the same shape `from_yaml_str` accepts.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::PolicyParse` if serialisation fails.
    pub fn to_yaml(&self) -> RelationResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for RelationPolicy {
    /// The portal's clinical-relevance heuristics. These offsets are
    /// product behaviour: a change here changes which records surface next
    /// to an anchor.
    fn default() -> Self {
        use RecordKind::{Appointment, Imaging, Intervention, LabResult, Medication};

        let range = |before: u32, after: u32| WindowMode::Range {
            before: DaySpan::from(before),
            after: DaySpan::from(after),
        };
        let rule = |anchor, related, mode, sort| RelationRule {
            anchor,
            related,
            mode,
            sort,
        };

        let rules = vec![
            rule(
                Appointment,
                LabResult,
                range(30, 14),
                SortStrategy::DateThenPanel,
            ),
            rule(
                Appointment,
                Medication,
                WindowMode::Symmetric {
                    days: DaySpan::from(7),
                },
                SortStrategy::ListOrderThenDate,
            ),
            rule(Appointment, Imaging, range(60, 40), SortStrategy::DateDesc),
            rule(
                Appointment,
                Intervention,
                range(7, 90),
                SortStrategy::DateDesc,
            ),
            rule(Imaging, Imaging, range(90, 90), SortStrategy::DateDesc),
            rule(
                Imaging,
                Medication,
                range(5, 14),
                SortStrategy::ListOrderThenDate,
            ),
            rule(Imaging, Intervention, range(7, 14), SortStrategy::DateDesc),
            rule(Imaging, Appointment, range(30, 40), SortStrategy::DateDesc),
            rule(
                Intervention,
                Imaging,
                range(90, 15),
                SortStrategy::DateDesc,
            ),
            rule(
                Intervention,
                Medication,
                range(14, 14),
                SortStrategy::ListOrderThenDate,
            ),
            rule(
                Intervention,
                Intervention,
                range(7, 14),
                SortStrategy::DateDesc,
            ),
            rule(
                Intervention,
                Appointment,
                range(60, 40),
                SortStrategy::DateDesc,
            ),
            rule(
                Medication,
                Imaging,
                WindowMode::RangeOpenEnded {
                    before: DaySpan::from(5),
                    after: DaySpan::from(14),
                },
                SortStrategy::DateDesc,
            ),
            rule(
                Medication,
                Intervention,
                range(7, 14),
                SortStrategy::DateDesc,
            ),
            rule(
                Medication,
                Appointment,
                range(60, 40),
                SortStrategy::DateDesc,
            ),
            rule(
                Medication,
                LabResult,
                WindowMode::RangeGated {
                    before: DaySpan::from(14),
                    after: DaySpan::from(14),
                    min_span_days: DaySpan::from(14),
                },
                SortStrategy::DateThenPanel,
            ),
        ];

        Self { rules }
    }
}
