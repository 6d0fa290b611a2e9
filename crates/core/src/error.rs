#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::format::ParseError,
    },
    #[error("invalid UTC offset '{0}' (expected the form +HH:MM or -HH:MM)")]
    InvalidUtcOffset(String),
    #[error("failed to read relation policy file: {0}")]
    PolicyRead(std::io::Error),
    #[error("failed to parse relation policy YAML: {0}")]
    PolicyParse(#[from] serde_yaml::Error),
    #[error("failed to parse record JSON: {0}")]
    RecordParse(#[from] serde_json::Error),
}

pub type RelationResult<T> = std::result::Result<T, RelationError>;
