use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use serde_json::Value;

use crate::body::RequestBody;
use crate::boundary::generate_boundary;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::executor::RequestExecutor;
use crate::multipart::{self, Form};
use crate::request::{Request, RequestBuilder};
use crate::response::{DecodedResponse, RawResponse, Response};
use crate::sse::EventListener;

/// Per-event callback accepted by the client methods
pub type Listener<'a> = Option<&'a mut (dyn EventListener + Send)>;

/// HTTP client with buffered JSON, raw and event-stream responses.
///
/// Cloning is cheap; clones share the connection pool of the underlying
/// transport. Requests share no other state.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<RequestExecutor>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create client from configuration
    ///
    /// # Errors
    /// Returns `ClientError::Build` if the transport cannot be initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            inner: Arc::new(RequestExecutor::new(config)?),
        })
    }

    /// Execute a request and decode the response by its content type.
    ///
    /// For `text/event-stream` responses `listener` is called once per event,
    /// in arrival order, while the body is still being received.
    ///
    /// # Errors
    /// - `ClientError::Build` for an unusable URL or header value
    /// - `ClientError::Connection`, `Timeout` or `Transport` when the exchange fails
    /// - `ClientError::Decode` when a JSON response does not parse
    /// - `ClientError::Stream` when an event stream is cut off midway
    ///
    /// An HTTP error status is not an error.
    pub async fn execute(
        &self,
        request: Request,
        listener: Listener<'_>,
    ) -> Result<Response, ClientError> {
        self.inner.execute(request, listener).await
    }

    /// Generic request; `body` is sent verbatim and the raw payload returned.
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<RawResponse, ClientError> {
        let request = Request::builder()
            .method(method)
            .url(url)
            .query(query.iter().copied())
            .header_map(headers)
            .body(body.map_or(RequestBody::Empty, RequestBody::Bytes))
            .build()?;
        Ok(self.execute(request, None).await?.into_raw())
    }

    /// GET with query parameters
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn get(
        &self,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        query: &[(&str, &str)],
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        self.query_request(Method::GET, url, authorization, headers, query, listener)
            .await
    }

    /// DELETE with query parameters
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn del(
        &self,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        query: &[(&str, &str)],
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        self.query_request(Method::DELETE, url, authorization, headers, query, listener)
            .await
    }

    /// POST a JSON payload; `None` sends `{}`
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn post(
        &self,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        params: Option<Value>,
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        self.json_request(Method::POST, url, authorization, headers, params, listener)
            .await
    }

    /// PUT a JSON payload; `None` sends `{}`
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn put(
        &self,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        params: Option<Value>,
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        self.json_request(Method::PUT, url, authorization, headers, params, listener)
            .await
    }

    /// PATCH a JSON payload; `None` sends `{}`
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn patch(
        &self,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        params: Option<Value>,
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        self.json_request(Method::PATCH, url, authorization, headers, params, listener)
            .await
    }

    /// Send a `multipart/form-data` body with any method, returning raw bytes
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn submit(
        &self,
        method: Method,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        form: &Form,
    ) -> Result<RawResponse, ClientError> {
        let request = multipart_request(method, url, authorization, headers, form)?;
        Ok(self.execute(request, None).await?.into_raw())
    }

    /// POST a `multipart/form-data` body, returning decoded data
    ///
    /// # Errors
    /// Same as [`HttpClient::execute`].
    pub async fn upload(
        &self,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        form: &Form,
    ) -> Result<DecodedResponse, ClientError> {
        let request = multipart_request(Method::POST, url, authorization, headers, form)?;
        Ok(self.execute(request, None).await?.into_decoded())
    }

    // GET and DELETE carry no body but still announce JSON.
    async fn query_request(
        &self,
        method: Method,
        url: &str,
        authorization: Option<&str>,
        mut headers: HeaderMap,
        query: &[(&str, &str)],
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        let request = base_request(method, url, authorization, headers)
            .query(query.iter().copied())
            .build()?;
        Ok(self.execute(request, listener).await?.into_decoded())
    }

    async fn json_request(
        &self,
        method: Method,
        url: &str,
        authorization: Option<&str>,
        headers: HeaderMap,
        params: Option<Value>,
        listener: Listener<'_>,
    ) -> Result<DecodedResponse, ClientError> {
        let params = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let request = base_request(method, url, authorization, headers)
            .body(RequestBody::Json(params))
            .build()?;
        Ok(self.execute(request, listener).await?.into_decoded())
    }
}

// Caller headers go in first; the authorization credential is applied after
// them during execution.
fn base_request(
    method: Method,
    url: &str,
    authorization: Option<&str>,
    headers: HeaderMap,
) -> RequestBuilder {
    let builder = Request::builder().method(method).url(url).header_map(headers);
    match authorization {
        Some(authorization) => builder.authorization(authorization),
        None => builder,
    }
}

fn multipart_request(
    method: Method,
    url: &str,
    authorization: Option<&str>,
    mut headers: HeaderMap,
    form: &Form,
) -> Result<Request, ClientError> {
    let boundary = generate_boundary();
    let content_type = HeaderValue::try_from(multipart::content_type(&boundary))
        .map_err(|e| ClientError::Build(format!("Invalid multipart content type: {e}")))?;
    headers.insert(CONTENT_TYPE, content_type);

    base_request(method, url, authorization, headers)
        .body(form.encode(&boundary))
        .build()
}
