//! In-process echo gateway used by the integration tests.
//!
//! Every unrouted request is answered with a JSON document describing what
//! the server received:
//!
//! ```json
//! {"http": {"method", "path", "query", "headers", "body", "body_base64"}, "params": {...}}
//! ```
//!
//! `params` merges the query string with a JSON object body.

#![allow(dead_code, clippy::unwrap_used)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;

pub const ECHO_HEADER: &str = "x-echo-gateway";

/// SSE body served by `/stream_response/`, deliberately split mid-line and
/// mid-event.
pub const STREAM_CHUNKS: [&str; 4] = [
    "data: {\"a\":1,",
    "\"b\":2}\n\nevent: hel",
    "lo\ndata: [\"1\",\"2\",3]\n\n: keep-alive\n",
    "data: what\nid: abc\n\n",
];

pub struct EchoGateway {
    addr: SocketAddr,
}

impl EchoGateway {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app()).await.unwrap();
        });
        Self { addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

fn app() -> Router {
    Router::new()
        .route("/return_204/", any(no_content))
        .route("/stream_response/", any(stream_response))
        .route("/broken_stream/", any(broken_stream))
        .route("/malformed_json/", any(malformed_json))
        .route("/text/", any(text))
        .route("/slow/", any(slow))
        .fallback(echo)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let echoed_headers: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();

    let mut params = Map::new();
    if let Some(query) = uri.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json && let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(&body) {
        params.extend(fields);
    }

    let document = json!({
        "http": {
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "headers": echoed_headers,
            "body": String::from_utf8_lossy(&body),
            "body_base64": STANDARD.encode(&body),
        },
        "params": params,
    });

    (
        [(ECHO_HEADER, "true")],
        axum::Json(document),
    )
        .into_response()
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn stream_response() -> Response {
    let chunks = futures::stream::iter(
        STREAM_CHUNKS
            .into_iter()
            .map(|chunk| Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))),
    );
    axum::http::Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(chunks))
        .unwrap()
}

/// Sends one complete event and half of a second, then fails the body.
async fn broken_stream() -> Response {
    let chunks = futures::stream::unfold(0u8, |step| async move {
        let item = match step {
            0 => Ok(Bytes::from_static(b"data: one\n\n")),
            1 => Ok(Bytes::from_static(b"data: tw")),
            2 => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Err(std::io::Error::other("upstream went away"))
            }
            _ => return None,
        };
        Some((item, step + 1))
    });
    axum::http::Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(chunks))
        .unwrap()
}

async fn malformed_json() -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        "{\"unterminated\": ",
    )
        .into_response()
}

async fn text() -> Response {
    ([(header::CONTENT_TYPE, "text/plain")], "Hello, World!").into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK.into_response()
}

/// A local port with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

/// Split a raw multipart body into `(headers, payload)` pairs.
pub fn split_multipart(body: &[u8], boundary: &str) -> Vec<(String, Vec<u8>)> {
    let opening = format!("--{boundary}\r\n");
    let delimiter = format!("\r\n--{boundary}\r\n");
    let closing = format!("\r\n--{boundary}--");

    assert!(body.starts_with(opening.as_bytes()), "missing opening boundary");
    assert!(body.ends_with(closing.as_bytes()), "missing closing boundary");
    let inner = &body[opening.len()..body.len() - closing.len()];

    split_on(inner, delimiter.as_bytes())
        .into_iter()
        .map(|part| match find(part, b"\r\n\r\n") {
            Some(end) => (
                String::from_utf8_lossy(&part[..end]).into_owned(),
                part[end + 4..].to_vec(),
            ),
            None => (String::new(), part.to_vec()),
        })
        .collect()
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(pos) = find(rest, needle) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    parts.push(rest);
    parts
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
