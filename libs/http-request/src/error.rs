use http::StatusCode;
use thiserror::Error;

use crate::sse::EventAggregate;

/// Error types for one request/response cycle.
///
/// Nothing here is retried by the client; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request build error: {0}")]
    Build(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with `application/json` but the body did not parse.
    #[error("Decode error: status={status}: {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// The connection dropped while an event stream was being consumed.
    ///
    /// `partial` holds every event fully received before the drop. Those
    /// events were already handed to the listener.
    #[error("Event stream interrupted after {} events: {source}", partial.total())]
    Stream {
        #[source]
        source: reqwest::Error,
        partial: EventAggregate,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Whether the error came from the network layer rather than from the
    /// content the server returned.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Connection(_)
                | ClientError::Timeout(_)
                | ClientError::Transport(_)
                | ClientError::Stream { .. }
        )
    }

    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}
