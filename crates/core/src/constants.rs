//! Constants used throughout the clinrel core crate.

/// Wire format for calendar dates, matching what the portal API emits.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Human-readable date format for CLI and log output.
pub const DISPLAY_DATE_FORMAT: &str = "%d %b %Y";

/// Human-readable timestamp format used by timezone display conversion.
pub const DISPLAY_DATETIME_FORMAT: &str = "%d %b %Y %H:%M %:z";

/// Placeholder shown when a date is missing or unparseable.
pub const MISSING_DATE_PLACEHOLDER: &str = "N/A";

/// Default filename for a relation policy override.
pub const DEFAULT_POLICY_FILENAME: &str = "relations.yaml";
