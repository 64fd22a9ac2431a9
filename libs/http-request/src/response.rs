use bytes::Bytes;
use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use serde_json::Value;

use crate::sse::EventAggregate;

/// How a response body is read and decoded, chosen once from the response
/// head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyInterpretation {
    /// 204 No Content: the body is not read
    Empty,
    /// `application/json*`: buffered, then parsed
    Json,
    /// `text/event-stream`: decoded incrementally as chunks arrive
    EventStream,
    /// Anything else: buffered and exposed as raw bytes only
    Raw,
}

impl BodyInterpretation {
    #[must_use]
    pub fn select(status: StatusCode, headers: &HeaderMap) -> Self {
        if status == StatusCode::NO_CONTENT {
            return BodyInterpretation::Empty;
        }

        let Some(content_type) = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<mime::Mime>().ok())
        else {
            return BodyInterpretation::Raw;
        };

        if content_type.essence_str() == mime::TEXT_EVENT_STREAM.essence_str() {
            BodyInterpretation::EventStream
        } else if content_type
            .essence_str()
            .starts_with(mime::APPLICATION_JSON.essence_str())
        {
            BodyInterpretation::Json
        } else {
            BodyInterpretation::Raw
        }
    }
}

/// Decoded payload of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedData {
    Json(Value),
    Events(EventAggregate),
}

impl DecodedData {
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            DecodedData::Json(value) => Some(value),
            DecodedData::Events(_) => None,
        }
    }

    #[must_use]
    pub fn as_events(&self) -> Option<&EventAggregate> {
        match self {
            DecodedData::Events(events) => Some(events),
            DecodedData::Json(_) => None,
        }
    }
}

/// Result of one executed request.
///
/// `body` and `data` are both absent for no-content responses.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    data: Option<DecodedData>,
}

impl Response {
    pub(crate) fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Option<Bytes>,
        data: Option<DecodedData>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            data,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Undecoded body bytes
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn data(&self) -> Option<&DecodedData> {
        self.data.as_ref()
    }

    /// Project onto `{status, headers, body}`
    #[must_use]
    pub fn into_raw(self) -> RawResponse {
        RawResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }

    /// Project onto `{status, headers, data}`
    #[must_use]
    pub fn into_decoded(self) -> DecodedResponse {
        DecodedResponse {
            status: self.status,
            headers: self.headers,
            data: self.data,
        }
    }
}

/// Response with the undecoded payload.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Response with the decoded payload.
#[derive(Debug, Clone)]
pub struct DecodedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub data: Option<DecodedData>,
}

impl DecodedResponse {
    /// JSON payload, if the response was JSON
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.data.as_ref().and_then(DecodedData::as_json)
    }

    /// Event aggregate, if the response was an event stream
    #[must_use]
    pub fn events(&self) -> Option<&EventAggregate> {
        self.data.as_ref().and_then(DecodedData::as_events)
    }
}
