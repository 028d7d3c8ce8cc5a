use reqwest::StatusCode;
use thiserror::Error;

pub type CollectorResult<T> = Result<T, CollectorError>;

/// Errors surfaced while constructing or configuring the collector. The
/// capture and dispatch paths themselves never return errors to callers.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Outcome of a single delivery attempt. Only ever observed by the dispatch
/// task, which downgrades it to a warning; never propagated to capture.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint rejected event: {status}")]
    Rejected { status: StatusCode },
}
