pub mod cache;
pub mod client;
pub mod credential;
pub mod interceptor;
pub mod middleware;
pub mod request;
pub mod response;
pub mod transport;


pub use cache::ResultCache;
pub use client::ApiClient;
pub use request::RequestSpec;
pub use response::ResponseEnvelope;
pub use tower::BoxError;

use http::StatusCode;

/// Message used for a failed response whose body is empty.
pub const UNKNOWN_API_ERROR: &str = "Unknown API Error";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No response was obtained from the transport.
    #[error("network connection failed: {0}")]
    Network(#[source] BoxError),
    /// A response was obtained but its status is outside `200..=299`.
    #[error("api error ({status}): {message}")]
    Http { status: StatusCode, message: String },
    #[error("unexpected error: {0}")]
    Unexpected(#[source] BoxError),
}

impl Error {
    pub fn network<E>(e: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Network(e.into())
    }

    pub fn unexpected<E>(e: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Unexpected(e.into())
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(_) | Self::Unexpected(_) => None,
        }
    }

    /// Logs the failure the way the outermost caller is expected to, then
    /// lets it go. Nothing here aborts the process.
    pub fn report(&self) {
        match self {
            Self::Network(e) => {
                tracing::error!(error = %e, "network connection failed");
            }
            Self::Http { status, message } => {
                tracing::error!(status = status.as_u16(), message = %message, "api error");
            }
            Self::Unexpected(e) => {
                tracing::error!(error = %e, "unexpected error occurred");
            }
        }
    }
}
