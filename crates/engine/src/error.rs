#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine task has stopped; no further commands are accepted.
    #[error("engine task is no longer running")]
    Closed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for EngineError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        EngineError::Closed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for EngineError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        EngineError::Closed
    }
}
