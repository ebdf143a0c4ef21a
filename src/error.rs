//! Error types for a single request/response cycle.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, CallError>;

/// Why a call did not produce an entity.
#[derive(Debug, Error)]
pub enum CallError {
    /// The transport failed to issue the request or read the response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a 4xx/5xx status.
    #[error("server responded {status}: {body}")]
    Status {
        /// Status code returned by the server.
        status: StatusCode,
        /// Response body text, decompressed if it was gzip-encoded.
        body: String,
    },

    /// The body claimed to be gzip but could not be inflated.
    #[error("failed to decompress response body: {0}")]
    Decompress(#[source] std::io::Error),

    /// The body was not valid JSON for the requested entity.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Uploading a response body to blob storage failed.
    #[error("blob upload failed: {0}")]
    Storage(String),

    /// The caller cancelled the call before it completed.
    #[error("call cancelled")]
    Cancelled,

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse cause of a [`CallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Decode,
    Storage,
    Cancelled,
    InvalidRequest,
}

impl CallError {
    /// Returns the discriminated cause of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Status { .. } => ErrorKind::Network,
            Self::Decompress(_) | Self::Decode(_) => ErrorKind::Decode,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Display text followed by every underlying cause, joined with ": ".
    ///
    /// Causes whose text already appears earlier in the chain are skipped.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !detail.contains(&text) {
                detail.push_str(": ");
                detail.push_str(&text);
            }
            source = cause.source();
        }
        detail
    }

    /// Status code the server answered with, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_is_network_kind() {
        let err = CallError::Status {
            status: StatusCode::NOT_FOUND,
            body: "{\"Message\":\"missing\"}".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_decode_error_kind() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = CallError::from(json_err);
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("malformed payload"));
    }

    #[derive(Debug, Error)]
    #[error("invalid gzip header")]
    struct BadHeader(#[source] Truncated);

    #[derive(Debug, Error)]
    #[error("unexpected end of stream")]
    struct Truncated;

    #[test]
    fn test_detail_includes_root_cause() {
        let err = CallError::Decompress(std::io::Error::other(BadHeader(Truncated)));

        let detail = err.detail();

        assert!(detail.starts_with("failed to decompress response body: invalid gzip header"));
        assert!(detail.ends_with(": unexpected end of stream"));
        assert_eq!(detail.matches("invalid gzip header").count(), 1);
    }

    #[test]
    fn test_detail_without_source_is_display() {
        let err = CallError::Storage("denied".into());
        assert_eq!(err.detail(), err.to_string());
    }

    #[test]
    fn test_storage_and_cancelled_kinds() {
        assert_eq!(CallError::Storage("denied".into()).kind(), ErrorKind::Storage);
        assert_eq!(CallError::Cancelled.kind(), ErrorKind::Cancelled);
    }
}
