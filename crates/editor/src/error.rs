use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pole not found: {0}")]
    UnknownPole(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
