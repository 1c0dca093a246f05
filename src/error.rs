/// Errors raised while rendering a record or writing it to a sink.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Malformed rank level '{0}', expected '<tier>_<division>'")]
    InvalidRankLevel(String),

    #[error("Missing {field} on {record}")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("Record does not have the expected shape: {0}")]
    InvalidRecord(serde_json::Error),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
