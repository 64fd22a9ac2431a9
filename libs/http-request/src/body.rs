use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;

/// Outgoing request body. Exactly one representation is active per request.
#[derive(Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON value, serialized compactly when the request is sent
    Json(Value),
    /// Pre-built payload (multipart form, raw text) sent verbatim
    Bytes(Bytes),
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "RequestBody::Empty"),
            RequestBody::Json(value) => f.debug_tuple("RequestBody::Json").field(value).finish(),
            RequestBody::Bytes(bytes) => {
                f.debug_tuple("RequestBody::Bytes").field(&bytes.len()).finish()
            }
        }
    }
}

impl RequestBody {
    /// Create a body from any JSON-serializable value
    ///
    /// # Errors
    /// Returns `ClientError::Serialization` if `value` cannot be represented
    /// as JSON.
    pub fn from_json<T: Serialize>(value: &T) -> Result<Self, ClientError> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    /// Create a body from pre-built bytes
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        RequestBody::Bytes(bytes.into())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Serialize into the bytes that go on the wire.
    pub(crate) fn into_wire(self) -> Result<Option<Bytes>, ClientError> {
        match self {
            RequestBody::Empty => Ok(None),
            RequestBody::Json(value) => Ok(Some(Bytes::from(serde_json::to_vec(&value)?))),
            RequestBody::Bytes(bytes) => Ok(Some(bytes)),
        }
    }
}

impl From<()> for RequestBody {
    fn from((): ()) -> Self {
        RequestBody::Empty
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}
