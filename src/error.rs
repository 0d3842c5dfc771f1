use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request record has no RequestName and {0} top-level keys, cannot determine its identity")]
    AmbiguousIdentity(usize),

    #[error("Invalid request {request}: {reason}")]
    InvalidRequest { request: String, reason: String },

    #[error("No campaign configuration found for campaign {0}")]
    MissingCampaignConfig(String),

    #[error("Dataset {0} could not be resolved in the dataset catalog")]
    UnresolvableDataset(String),

    #[error("Lookup of {kind} for {key} failed: {reason}")]
    FetchFailed { kind: &'static str, key: String, reason: String },

    #[error("Lookup of {kind} for {key} timed out")]
    FetchTimeout { kind: &'static str, key: String },

    #[error("Lookup of {kind} for {key} was not finished before the round deadline")]
    RoundDeadline { kind: &'static str, key: String },

    #[error("Invalid planner configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
