use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::body::RequestBody;
use crate::error::ClientError;

/// Methods the executor accepts.
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// HTTP request with method, URL, query parameters, headers and body
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    authorization: Option<String>,
    body: RequestBody,
}

impl Request {
    /// Create a new request builder
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters, appended to the URL in this order
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Credential to send as `Authorization`, before normalization
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            method: self.method,
            url: self.url,
            query: self.query,
            headers: self.headers,
            authorization: self.authorization,
            body: self.body,
        }
    }
}

/// Owned pieces of a [`Request`], consumed by the executor
pub struct RequestParts {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) authorization: Option<String>,
    pub(crate) body: RequestBody,
}

/// Builder for constructing HTTP requests with a fluent API
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    authorization: Option<String>,
    body: RequestBody,
}

impl RequestBuilder {
    /// Set the HTTP method (defaults to GET)
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the target URL
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Append one query parameter
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters, keeping their order
    #[must_use]
    pub fn query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a header, replacing any previous value under the same name
    ///
    /// # Errors
    /// Returns `ClientError::Build` if the name or value is not a valid header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Result<Self, ClientError>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Display,
        V::Error: std::fmt::Display,
    {
        let key = key
            .try_into()
            .map_err(|e| ClientError::Build(format!("Invalid header name: {e}")))?;
        let value = value
            .try_into()
            .map_err(|e| ClientError::Build(format!("Invalid header value: {e}")))?;
        self.headers.insert(key, value);
        Ok(self)
    }

    /// Merge a prepared header map, replacing values under the same names
    #[must_use]
    pub fn header_map(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Add every header of a `name -> value` mapping
    ///
    /// # Errors
    /// Returns `ClientError::Build` on the first invalid name or value.
    pub fn headers<I, K, V>(mut self, headers: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in headers {
            self = self.header(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Credential for the `Authorization` header. Bare tokens are sent as
    /// `Bearer <token>`; see [`crate::normalize_authorization`].
    #[must_use]
    pub fn authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Set the body to a JSON-serialized value
    ///
    /// # Errors
    /// Returns `ClientError::Serialization` if `value` cannot be represented
    /// as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, ClientError> {
        self.body = RequestBody::from_json(value)?;
        Ok(self)
    }

    /// Set the request body
    #[must_use]
    pub fn body<B: Into<RequestBody>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// Returns `ClientError::Build` when no URL was set or the method is not
    /// one of [`SUPPORTED_METHODS`].
    pub fn build(self) -> Result<Request, ClientError> {
        let method = self.method.unwrap_or(Method::GET);
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(ClientError::Build(format!("Unsupported method: {method}")));
        }
        let url = self
            .url
            .ok_or_else(|| ClientError::Build("Request URL is required".into()))?;

        Ok(Request {
            method,
            url,
            query: self.query,
            headers: self.headers,
            authorization: self.authorization,
            body: self.body,
        })
    }
}
