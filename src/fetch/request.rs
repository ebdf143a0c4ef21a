use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::error::{CallError, Result};

/// A prepared outbound call: method, target URI, headers and optional body.
///
/// The descriptor stays owned by the caller; the pipeline only borrows it and
/// renders a fresh [`reqwest::Request`] for each call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    uri: Url,
    headers: HeaderMap,
    body: Option<String>,
}

impl RequestDescriptor {
    /// Creates a descriptor with no headers and no body.
    pub fn new(method: Method, uri: &str) -> Result<Self> {
        let uri = Url::parse(uri)
            .map_err(|e| CallError::InvalidRequest(format!("invalid URI '{uri}': {e}")))?;
        Ok(Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    pub fn get(uri: &str) -> Result<Self> {
        Self::new(Method::GET, uri)
    }

    /// Sets the body text sent with the request. No `Content-Type` is
    /// added; use [`with_json`](Self::with_json) or
    /// [`with_header`](Self::with_header) to declare one.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type` to match.
    pub fn with_json(mut self, value: &impl Serialize) -> Result<Self> {
        let body = serde_json::to_string(value)
            .map_err(|e| CallError::InvalidRequest(format!("body serialization failed: {e}")))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        Ok(self)
    }

    /// Adds a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CallError::InvalidRequest(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CallError::InvalidRequest(format!("invalid value for '{name}': {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Asks the server to gzip the response.
    pub fn accept_gzip(mut self) -> Self {
        self.headers
            .insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body text, if any. An empty string counts as no body.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }

    /// Renders the request the transport will send.
    pub(crate) fn to_request(&self) -> reqwest::Request {
        let mut req = reqwest::Request::new(self.method.clone(), self.uri.clone());
        *req.headers_mut() = self.headers.clone();
        if let Some(body) = self.body() {
            *req.body_mut() = Some(body.to_owned().into());
        }
        req
    }
}
