//! `multipart/form-data` body encoding.
//!
//! Fields are emitted in insertion order. Each part carries a
//! `Content-Disposition` line, a `Content-Type` line, an optional
//! `Content-Transfer-Encoding` line, a blank line and then the payload.
//! Line endings are always CRLF.
//!
//! Framing: `--<boundary>\r\n` opens the body, parts are separated by
//! `\r\n--<boundary>\r\n` and `\r\n--<boundary>--` closes it. A form with no
//! fields still produces a single empty frame (`--b\r\n\r\n--b--`).

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;

const OCTET_STREAM: &str = "application/octet-stream";
const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";
const CRLF: &[u8] = b"\r\n";

/// Optional metadata attached to a binary part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartMetadata {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub transfer_encoding: Option<String>,
}

/// A binary payload together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub data: Bytes,
    pub metadata: PartMetadata,
}

impl FilePart {
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            metadata: PartMetadata::default(),
        }
    }

    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.metadata.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.metadata.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn transfer_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.metadata.transfer_encoding = Some(encoding.into());
        self
    }
}

/// Value of a single form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// Raw bytes, `application/octet-stream` unless the metadata says otherwise
    Bytes(FilePart),
    /// Structured value, emitted as compact JSON
    Json(Value),
    /// Scalar, emitted as its string form
    Text(String),
}

impl FormValue {
    fn content_type(&self) -> &str {
        match self {
            FormValue::Bytes(part) => part.metadata.content_type.as_deref().unwrap_or(OCTET_STREAM),
            FormValue::Json(_) => APPLICATION_JSON,
            FormValue::Text(_) => TEXT_PLAIN,
        }
    }

    fn write_payload(&self, buf: &mut BytesMut) {
        match self {
            FormValue::Bytes(part) => buf.put_slice(&part.data),
            FormValue::Json(value) => buf.put_slice(value.to_string().as_bytes()),
            FormValue::Text(text) => buf.put_slice(text.as_bytes()),
        }
    }
}

impl From<FilePart> for FormValue {
    fn from(part: FilePart) -> Self {
        FormValue::Bytes(part)
    }
}

impl From<Bytes> for FormValue {
    fn from(data: Bytes) -> Self {
        FormValue::Bytes(FilePart::new(data))
    }
}

impl From<Vec<u8>> for FormValue {
    fn from(data: Vec<u8>) -> Self {
        FormValue::Bytes(FilePart::new(data))
    }
}

impl From<String> for FormValue {
    fn from(text: String) -> Self {
        FormValue::Text(text)
    }
}

impl From<&str> for FormValue {
    fn from(text: &str) -> Self {
        FormValue::Text(text.to_owned())
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Text(n.to_string())
    }
}

impl From<f64> for FormValue {
    fn from(n: f64) -> Self {
        FormValue::Text(n.to_string())
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Text(b.to_string())
    }
}

/// Scalars become text parts; objects, arrays and `null` become JSON parts.
impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => FormValue::Text(s),
            Value::Number(n) => FormValue::Text(n.to_string()),
            Value::Bool(b) => FormValue::Text(b.to_string()),
            other @ (Value::Null | Value::Array(_) | Value::Object(_)) => FormValue::Json(other),
        }
    }
}

/// Ordered collection of form fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    fields: Vec<(String, FormValue)>,
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field of any supported kind
    #[must_use]
    pub fn part(mut self, name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(name, FormValue::Text(value.into()))
    }

    #[must_use]
    pub fn json(self, name: impl Into<String>, value: Value) -> Self {
        self.part(name, FormValue::Json(value))
    }

    #[must_use]
    pub fn file(self, name: impl Into<String>, file: FilePart) -> Self {
        self.part(name, FormValue::Bytes(file))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Serialize the form into a `multipart/form-data` body.
    ///
    /// The output depends only on the fields and the boundary, so encoding
    /// the same form twice yields identical bytes.
    #[must_use]
    pub fn encode(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(CRLF);

        for (index, (name, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                put_delimiter(&mut buf, boundary);
            }
            write_part(&mut buf, name, value);
        }

        buf.put_slice(CRLF);
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"--");
        buf.freeze()
    }
}

impl<K, V> FromIterator<(K, V)> for Form
where
    K: Into<String>,
    V: Into<FormValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// `Content-Type` header value the caller must send alongside an encoded form.
#[must_use]
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

fn put_delimiter(buf: &mut BytesMut, boundary: &str) {
    buf.put_slice(CRLF);
    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(CRLF);
}

fn write_part(buf: &mut BytesMut, name: &str, value: &FormValue) {
    buf.put_slice(b"Content-Disposition: form-data; name=\"");
    buf.put_slice(escape_quoted(name).as_bytes());
    buf.put_u8(b'"');
    if let FormValue::Bytes(FilePart {
        metadata: PartMetadata { filename: Some(filename), .. },
        ..
    }) = value
    {
        buf.put_slice(b"; filename=\"");
        buf.put_slice(escape_quoted(filename).as_bytes());
        buf.put_u8(b'"');
    }
    buf.put_slice(CRLF);

    buf.put_slice(b"Content-Type: ");
    buf.put_slice(value.content_type().as_bytes());
    buf.put_slice(CRLF);

    if let FormValue::Bytes(FilePart {
        metadata: PartMetadata { transfer_encoding: Some(encoding), .. },
        ..
    }) = value
    {
        buf.put_slice(b"Content-Transfer-Encoding: ");
        buf.put_slice(encoding.as_bytes());
        buf.put_slice(CRLF);
    }

    buf.put_slice(CRLF);
    value.write_payload(buf);
}

// Quotes and line breaks would terminate the header parameter early.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
