//! Response extraction: decompression, JSON decoding and header metadata.
//!
//! [`extract`] drains a response exactly once and turns it into an
//! [`Extracted`] value holding the typed entity alongside the raw body text,
//! the `Location` header and the status code. Entities that carry a
//! concurrency token opt in through [`Entity::etag_support`] and receive the
//! response's `ETag` header after decoding.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ETAG, HeaderMap, HeaderName, LOCATION};
use serde::de::DeserializeOwned;

use crate::error::{CallError, Result};
use crate::fetch::compression::{gunzip, is_gzipped};

/// An entity that carries a version/concurrency token.
pub trait ETagSupport {
    fn etag(&self) -> &str;
    fn set_etag(&mut self, etag: String);
}

/// A payload shape the pipeline can decode into.
///
/// Override [`etag_support`](Entity::etag_support) to receive the `ETag`
/// response header.
pub trait Entity: DeserializeOwned + Send + 'static {
    fn etag_support(&mut self) -> Option<&mut dyn ETagSupport> {
        None
    }
}

impl Entity for serde_json::Value {}

impl Entity for String {}

impl<T: DeserializeOwned + Send + 'static> Entity for Vec<T> {}

/// Everything read out of one successful response.
#[derive(Debug)]
pub struct Extracted<T> {
    pub status: StatusCode,
    pub location: Option<String>,
    pub etag: Option<String>,
    /// `None` when the body was empty.
    pub entity: Option<T>,
    pub raw_body: String,
}

/// What a caller receives from the awaitable adapter.
///
/// On failure every field is empty; `status == None` is the sentinel for
/// "no response was obtained".
#[derive(Debug)]
pub struct ResponseEnvelope<T> {
    pub status: Option<StatusCode>,
    pub location: Option<String>,
    pub etag: Option<String>,
    pub entity: Option<T>,
    /// Body text as received, before JSON decoding.
    pub raw_body: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    /// The empty envelope handed back when a call fails.
    pub fn sentinel() -> Self {
        Self {
            status: None,
            location: None,
            etag: None,
            entity: None,
            raw_body: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.status.is_none()
    }

    pub fn into_parts(self) -> (Option<StatusCode>, Option<String>, Option<T>) {
        (self.status, self.location, self.entity)
    }
}

impl<T> From<Extracted<T>> for ResponseEnvelope<T> {
    fn from(extracted: Extracted<T>) -> Self {
        Self {
            status: Some(extracted.status),
            location: extracted.location,
            etag: extracted.etag,
            entity: extracted.entity,
            raw_body: Some(extracted.raw_body),
        }
    }
}

/// Drains `response` and decodes its body into `T`.
///
/// 4xx/5xx responses are not decoded; their body text is returned inside
/// [`CallError::Status`].
pub async fn extract<T: Entity>(response: reqwest::Response) -> Result<Extracted<T>> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    extract_parts(status, &headers, body)
}

/// Synchronous half of [`extract`], operating on an already drained body.
pub fn extract_parts<T: Entity>(
    status: StatusCode,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Extracted<T>> {
    let location = header_text(headers, LOCATION);
    let etag = header_text(headers, ETAG);
    let raw_body = body_text(headers, &body)?;

    if status.is_client_error() || status.is_server_error() {
        return Err(CallError::Status {
            status,
            body: raw_body,
        });
    }

    let mut entity = decode::<T>(&raw_body)?;
    if let Some(support) = entity.as_mut().and_then(|e| e.etag_support()) {
        support.set_etag(etag.clone().unwrap_or_default());
    }

    Ok(Extracted {
        status,
        location,
        etag,
        entity,
        raw_body,
    })
}

/// Decodes `raw` as JSON. Blank input decodes to `None`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<Option<T>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(raw)?))
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn body_text(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    let text = if is_gzipped(headers) {
        let inflated = gunzip(body).map_err(CallError::Decompress)?;
        String::from_utf8_lossy(&inflated).into_owned()
    } else {
        String::from_utf8_lossy(body).into_owned()
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_owned(),
        None => text,
    })
}
