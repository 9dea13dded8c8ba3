use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Field-level validation messages, keyed by input field name.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ok when no messages were collected, otherwise the validation failure.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Error {
        let mut errors = Self::new();
        errors.push(field, message);
        Error::Validation(errors)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("task already submitted by this user")]
    AlreadySubmitted,
    #[error("task has no remaining capacity")]
    TaskExhausted,
    #[error("transaction already processed")]
    AlreadyProcessed,
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// A state conflict the caller can act on (retry, give up) as opposed to a
    /// missing entity or a server fault.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadySubmitted | Self::TaskExhausted | Self::AlreadyProcessed
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {e}"))
    }
}
