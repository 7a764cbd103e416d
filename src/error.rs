use thiserror::Error;

/// Failure modes of a facade call. An empty result set is not an error;
/// it comes back as a successful envelope with no data.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status { status: reqwest::StatusCode },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        ApiError::Status { status }
    }
}
