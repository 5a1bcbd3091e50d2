use thiserror::Error;

/// Why a single lookup failed.
///
/// These never leave the worker: the dispatcher turns every one of them into a
/// failure sentinel and the batch carries on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not read api key: {0}")]
    Credential(String),

    #[error("request for {location} failed: {message}")]
    Transport { location: String, message: String },

    #[error("provider answered {status} for {location}")]
    Status { location: String, status: u16 },

    #[error("could not decode provider response for {location}: {message}")]
    Decode { location: String, message: String },
}

/// Gather-side protocol failures.
///
/// Any of these means the one-publish-per-task contract was broken somewhere;
/// they are surfaced as a failed batch rather than retried.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("result channel closed after {received} of {expected} results")]
    ChannelClosed { received: usize, expected: usize },

    #[error("claimed an available item but the queue was empty")]
    ClaimWithoutItem,

    #[error("yield consumer failed: {0}")]
    Consumer(String),
}
