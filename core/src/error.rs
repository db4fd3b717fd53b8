// core/src/error.rs
use std::string::FromUtf8Error;

use thiserror::Error;

/// Hvorfor lagret historikk ikke kunne lastes. Alle tre er "myke" feil:
/// kalleren faller tilbake til tom historikk.
#[derive(Error, Debug)]
pub enum HistoryLoadError {
    #[error("no persisted history under key '{0}'")]
    Absent(String),

    #[error("persisted history is not valid UTF-8 text: {0}")]
    NotText(#[from] FromUtf8Error),

    #[error("history parse at {path}: {message}")]
    Decode { path: String, message: String },
}

impl HistoryLoadError {
    /// Kort navn brukt som label i metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            HistoryLoadError::Absent(_) => "absent",
            HistoryLoadError::NotText(_) => "not_text",
            HistoryLoadError::Decode { .. } => "decode",
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkoutError {
    #[error("sensor session could not be created: {0}")]
    SessionCreation(String),

    #[error("persisted history unreadable: {0}")]
    PersistenceDecode(#[from] HistoryLoadError),

    #[error("history could not be encoded: {0}")]
    PersistenceEncode(#[source] serde_json::Error),

    #[error("'{op}' not allowed while {state}")]
    Precondition { op: &'static str, state: String },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WorkoutError>;
