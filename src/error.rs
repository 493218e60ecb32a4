use thiserror::Error;

/// Hard failures of the client library.
///
/// Transport and decode problems are not represented here: the gateway
/// reports them to the user and hands back "no result" instead.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be built, e.g. the configured host does not
    /// form a valid URL. This is a client-side defect, not a network one.
    #[error("An error occurred while constructing the request: {0}")]
    Request(#[source] reqwest::Error),

    /// A request payload could not be encoded as JSON.
    #[error("An error occurred while constructing the request: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing to the output sink failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
