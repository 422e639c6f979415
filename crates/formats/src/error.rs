#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("view document is missing `{0}`")]
    MissingField(&'static str),
    #[error("duplicate {kind} id `{id}` in view")]
    DuplicateId { kind: &'static str, id: String },
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
