use thiserror::Error;

use crate::history::RecordId;

/// Problems with the add-device form, detected before anything is written.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("please enter a valid duration")]
    ZeroDuration,
    #[error("minutes should be less than 60")]
    MinutesOutOfRange,
    #[error("please select a device")]
    NoDeviceSelected,
    #[error("unknown device type '{0}'")]
    UnknownDevice(String),
    #[error("please select frequency of use")]
    NoFrequencySelected,
    #[error("please select at least one day")]
    NoDaysSelected,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unable to read '{key}' from storage: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write '{key}' to storage: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored '{key}' has an unexpected shape: {reason}")]
    Decode { key: String, reason: String },
}

impl PersistenceError {
    pub(crate) fn decode(key: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no usage record with id {0}")]
    NotFound(RecordId),
    #[error("a usage record with id {0} already exists")]
    DuplicateId(RecordId),
    #[error("usage record cannot be stored: {0}")]
    InvalidEntry(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CatalogError {
    #[error("device type '{0}' is not in the catalog")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("error saving device: {0}")]
    Failed(#[from] HistoryError),
}
