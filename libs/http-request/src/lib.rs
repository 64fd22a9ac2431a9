//! HTTP request engine
//!
//! Builds outgoing requests from method, URL, headers and query parameters,
//! sends them, and turns the response into a typed result:
//!
//! - JSON request bodies (compact, `application/json` by default)
//! - `multipart/form-data` bodies built from an ordered [`Form`]
//! - buffered responses, JSON-decoded when the server says `application/json`
//! - `text/event-stream` responses decoded incrementally into [`SseEvent`]s,
//!   delivered to an [`EventListener`] and collected into an [`EventAggregate`]
//!
//! # Examples
//!
//! ## JSON
//!
//! ```no_run
//! use http_request::{ClientConfig, HttpClient};
//! use http::HeaderMap;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientConfig::from_env()?)?;
//!
//! let response = client
//!     .post(
//!         "https://api.example.com/v1/items",
//!         Some("token"),
//!         HeaderMap::new(),
//!         Some(json!({"name": "widget"})),
//!         None,
//!     )
//!     .await?;
//! println!("{} {:?}", response.status, response.json());
//! # Ok(())
//! # }
//! ```
//!
//! ## Server-Sent Events
//!
//! ```no_run
//! use http_request::{ClientConfig, HttpClient, SseEvent};
//! use http::HeaderMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientConfig::default())?;
//!
//! let mut on_event = |event: &SseEvent| println!("{}: {}", event.event, event.data);
//! let response = client
//!     .get("https://api.example.com/stream", None, HeaderMap::new(), &[], Some(&mut on_event))
//!     .await?;
//!
//! if let Some(events) = response.events() {
//!     println!("received {} events", events.total());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Multipart upload
//!
//! ```no_run
//! use http_request::{ClientConfig, FilePart, Form, HttpClient};
//! use http::HeaderMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientConfig::default())?;
//!
//! let form = Form::new()
//!     .text("purpose", "fine-tune")
//!     .file("file", FilePart::new(std::fs::read("data.zip")?).filename("data.zip"));
//! let response = client
//!     .upload("https://api.example.com/files", Some("token"), HeaderMap::new(), &form)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod body;
mod boundary;
mod client;
mod config;
mod error;
mod executor;
mod multipart;
mod request;
mod response;
mod sse;

// Re-export public API
pub use auth::normalize_authorization;
pub use body::RequestBody;
pub use boundary::generate_boundary;
pub use client::{HttpClient, Listener};
pub use config::ClientConfig;
pub use error::ClientError;
pub use multipart::{
    FilePart, Form, FormValue, PartMetadata, content_type as multipart_content_type,
};
pub use request::{Request, RequestBuilder, SUPPORTED_METHODS};
pub use response::{BodyInterpretation, DecodedData, DecodedResponse, RawResponse, Response};
pub use sse::{EventAggregate, EventListener, SseDecoder, SseEvent};

// Re-export commonly used types from dependencies
pub use http::{HeaderMap, Method, StatusCode};
