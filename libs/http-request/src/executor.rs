use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use tokio::sync::mpsc;
use url::Url;

use crate::auth::normalize_authorization;
use crate::body::RequestBody;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::Request;
use crate::response::{BodyInterpretation, DecodedData, Response};
use crate::sse::{EventCollector, EventListener};

/// Runs one request/response cycle over a shared `reqwest::Client`.
pub struct RequestExecutor {
    http_client: reqwest::Client,
    event_channel_capacity: usize,
}

impl RequestExecutor {
    pub(crate) fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http_client,
            event_channel_capacity: config.event_channel_capacity.max(1),
        })
    }

    pub(crate) async fn execute(
        &self,
        request: Request,
        listener: Option<&mut (dyn EventListener + Send)>,
    ) -> Result<Response, ClientError> {
        let parts = request.into_parts();
        let url = build_url(&parts.url, &parts.query)?;
        let headers = prepare_headers(parts.headers, parts.authorization.as_deref(), &parts.body)?;
        let body = parts.body.into_wire()?;

        tracing::debug!(method = %parts.method, url = %url, "sending request");

        let mut req_builder = self
            .http_client
            .request(parts.method, url)
            .headers(headers);
        if let Some(body) = body {
            req_builder = req_builder.body(body);
        }

        let resp = req_builder.send().await.map_err(ClientError::from_send)?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let interpretation = BodyInterpretation::select(status, &headers);

        tracing::debug!(status = %status, ?interpretation, "response received");

        match interpretation {
            BodyInterpretation::Empty => Ok(Response::new(status, headers, None, None)),
            BodyInterpretation::EventStream => {
                self.read_event_stream(status, headers, resp, listener).await
            }
            BodyInterpretation::Json => {
                let bytes = resp.bytes().await.map_err(ClientError::from_send)?;
                if bytes.is_empty() {
                    return Ok(Response::new(status, headers, None, None));
                }
                let value = serde_json::from_slice(&bytes)
                    .map_err(|source| ClientError::Decode { status, source })?;
                Ok(Response::new(
                    status,
                    headers,
                    Some(bytes),
                    Some(DecodedData::Json(value)),
                ))
            }
            BodyInterpretation::Raw => {
                let bytes = resp.bytes().await.map_err(ClientError::from_send)?;
                let body = (!bytes.is_empty()).then_some(bytes);
                Ok(Response::new(status, headers, body, None))
            }
        }
    }

    /// Decode an event stream as it arrives.
    ///
    /// A spawned task forwards body chunks into a bounded channel; this task
    /// drains it in order, feeding the decoder and the listener.
    async fn read_event_stream(
        &self,
        status: StatusCode,
        headers: HeaderMap,
        resp: reqwest::Response,
        listener: Option<&mut (dyn EventListener + Send)>,
    ) -> Result<Response, ClientError> {
        let (tx, mut rx) =
            mpsc::channel::<Result<Bytes, reqwest::Error>>(self.event_channel_capacity);

        let mut chunks = resp.bytes_stream();
        let producer = tokio::spawn(async move {
            while let Some(chunk) = chunks.next().await {
                let failed = chunk.is_err();
                if tx.send(chunk).await.is_err() || failed {
                    break;
                }
            }
        });

        let mut collector = EventCollector::new(listener);
        let mut raw = BytesMut::new();

        while let Some(chunk) = rx.recv().await {
            match chunk {
                Ok(bytes) => {
                    tracing::trace!(len = bytes.len(), "event stream chunk");
                    raw.extend_from_slice(&bytes);
                    collector.feed(&bytes);
                }
                Err(source) => {
                    tracing::warn!(error = %source, "event stream interrupted");
                    producer.abort();
                    return Err(ClientError::Stream {
                        source,
                        partial: collector.into_partial(),
                    });
                }
            }
        }

        if let Err(err) = producer.await
            && err.is_panic()
        {
            std::panic::resume_unwind(err.into_panic());
        }

        let aggregate = collector.finish();
        if raw.is_empty() {
            return Ok(Response::new(status, headers, None, None));
        }
        Ok(Response::new(
            status,
            headers,
            Some(raw.freeze()),
            Some(DecodedData::Events(aggregate)),
        ))
    }
}

/// Append query parameters to the URL's own query string.
///
/// Only the parsed scheme, host and port pick the connection target; the
/// path is never inspected.
fn build_url(raw: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(raw).map_err(|e| ClientError::Build(format!("Invalid URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Build(format!(
            "Unsupported URL scheme: {}",
            url.scheme()
        )));
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

/// Apply the authorization credential (after caller headers, so it wins) and
/// the JSON content type default.
fn prepare_headers(
    mut headers: HeaderMap,
    authorization: Option<&str>,
    body: &RequestBody,
) -> Result<HeaderMap, ClientError> {
    if let Some(authorization) = authorization {
        let mut value = HeaderValue::try_from(normalize_authorization(authorization))
            .map_err(|e| ClientError::Build(format!("Invalid authorization value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    if matches!(body, RequestBody::Json(_)) && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}
