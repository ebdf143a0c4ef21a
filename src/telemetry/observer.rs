use chrono::Utc;
use reqwest::{Method, StatusCode, Url};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

use super::record::{CallRecord, DEPENDENCY, RecordLevel, ResponseBody};
use super::sink::{RecordSink, TracingSink};
use crate::error::CallError;
use crate::infra::blob::BlobStore;

/// Response bodies longer than this many UTF-16 code units go to blob storage.
///
/// Characters outside the Basic Multilingual Plane (emoji, for one) count twice.
pub const INLINE_BODY_LIMIT: usize = 2000;

/// Container that receives oversized response bodies.
pub const LOG_CONTAINER: &str = "myob-logs";

/// Milliseconds between two monotonic instants; 0 if `finish` precedes `start`.
pub fn elapsed_ms(start: Instant, finish: Instant) -> f64 {
    finish.saturating_duration_since(start).as_secs_f64() * 1000.0
}

/// Builds and emits one [`CallRecord`] per call.
///
/// Telemetry never fails the call it describes: a blob upload error is
/// reported with `warn!` and the body is logged inline instead.
pub struct CallObserver {
    blobs: Arc<dyn BlobStore>,
    sink: Arc<dyn RecordSink>,
    dependency: String,
}

impl CallObserver {
    /// Observer emitting through [`TracingSink`].
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_sink(blobs, Arc::new(TracingSink))
    }

    pub fn with_sink(blobs: Arc<dyn BlobStore>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            blobs,
            sink,
            dependency: DEPENDENCY.to_string(),
        }
    }

    /// Records a completed call.
    ///
    /// Large bodies are uploaded before the record is emitted, so the blob
    /// address is readable by the time the record is visible.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_success(
        &self,
        method: &Method,
        uri: &Url,
        request_body: Option<&str>,
        status: StatusCode,
        response_body: &str,
        start: Instant,
        finish: Instant,
    ) -> CallRecord {
        let response_body = self.response_body(response_body).await;

        let record = CallRecord {
            timestamp: Utc::now(),
            level: RecordLevel::Debug,
            dependency: self.dependency.clone(),
            request_method: method.to_string(),
            request_path: uri.to_string(),
            status_code: status.as_u16(),
            elapsed_ms: elapsed_ms(start, finish),
            request_body: non_empty(request_body),
            response_body: Some(response_body),
            error: None,
            error_kind: None,
        };
        self.sink.emit(&record);
        record
    }

    /// Records a failed call, measuring elapsed time up to now.
    pub fn log_failure(
        &self,
        method: &Method,
        uri: &Url,
        request_body: Option<&str>,
        error: &CallError,
        start: Instant,
    ) -> CallRecord {
        let record = self.failure_record(method, uri, request_body, error, start);
        self.emit(&record);
        record
    }

    /// Builds the failure record without emitting it.
    pub fn failure_record(
        &self,
        method: &Method,
        uri: &Url,
        request_body: Option<&str>,
        error: &CallError,
        start: Instant,
    ) -> CallRecord {
        CallRecord {
            timestamp: Utc::now(),
            level: RecordLevel::Error,
            dependency: self.dependency.clone(),
            request_method: method.to_string(),
            request_path: uri.to_string(),
            status_code: 0,
            elapsed_ms: elapsed_ms(start, Instant::now()),
            request_body: non_empty(request_body),
            response_body: None,
            error: Some(error.detail()),
            error_kind: Some(error.kind()),
        }
    }

    pub fn emit(&self, record: &CallRecord) {
        self.sink.emit(record);
    }

    async fn response_body(&self, body: &str) -> ResponseBody {
        if utf16_len(body) <= INLINE_BODY_LIMIT {
            return ResponseBody::Inline(body.to_string());
        }

        let key = format!("{}.txt", Uuid::new_v4());
        match self.blobs.upload_text(LOG_CONTAINER, &key, body).await {
            Ok(address) => ResponseBody::Blob(address),
            Err(e) => {
                warn!(error = %e.detail(), key = %key, "Response body upload failed, logging inline");
                ResponseBody::Inline(body.to_string())
            }
        }
    }
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn non_empty(body: Option<&str>) -> Option<String> {
    body.filter(|b| !b.is_empty()).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Result};
    use crate::infra::blob::MemoryBlobStore;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorded(Mutex<Vec<CallRecord>>);

    impl RecordSink for Recorded {
        fn emit(&self, record: &CallRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl BlobStore for BrokenStore {
        async fn upload_text(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Err(CallError::Storage("access denied".to_string()))
        }
    }

    fn uri() -> Url {
        Url::parse("https://api.example.test/accountright/file/Contact/Customer").unwrap()
    }

    fn observer() -> (CallObserver, Arc<MemoryBlobStore>, Arc<Recorded>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let sink = Arc::new(Recorded::default());
        (CallObserver::with_sink(blobs.clone(), sink.clone()), blobs, sink)
    }

    #[test]
    fn test_elapsed_ms_from_instants() {
        let start = Instant::now();
        let finish = start + Duration::from_micros(1500);

        assert!((elapsed_ms(start, finish) - 1.5).abs() < 1e-9);
        assert_eq!(elapsed_ms(finish, start), 0.0);
    }

    #[tokio::test]
    async fn test_small_body_logged_inline() {
        let (observer, blobs, sink) = observer();
        let start = Instant::now();

        let record = observer
            .log_success(
                &Method::POST,
                &uri(),
                Some("{\"a\":1}"),
                StatusCode::OK,
                "{\"b\":2}",
                start,
                Instant::now(),
            )
            .await;

        assert_eq!(record.request_body.as_deref(), Some("{\"a\":1}"));
        assert_eq!(record.response_body, Some(ResponseBody::Inline("{\"b\":2}".into())));
        assert_eq!(record.status_code, 200);
        assert_eq!(record.level, RecordLevel::Debug);
        assert!(record.elapsed_ms >= 0.0);
        assert!(blobs.is_empty());
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_body_at_limit_stays_inline() {
        let (observer, blobs, _) = observer();
        let body = "x".repeat(INLINE_BODY_LIMIT);
        let now = Instant::now();

        let record = observer
            .log_success(&Method::GET, &uri(), None, StatusCode::OK, &body, now, now)
            .await;

        assert_eq!(record.response_body, Some(ResponseBody::Inline(body)));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_large_body_uploaded_once() {
        let (observer, blobs, _) = observer();
        let body = "y".repeat(3000);
        let now = Instant::now();

        let record = observer
            .log_success(&Method::GET, &uri(), None, StatusCode::OK, &body, now, now)
            .await;

        assert_eq!(blobs.len(), 1);
        let Some(ResponseBody::Blob(address)) = record.response_body else {
            panic!("expected blob reference");
        };
        assert_ne!(address, body);
        assert!(address.starts_with("memory://myob-logs/"));
        assert!(address.ends_with(".txt"));
        assert_eq!(blobs.get(&address), Some(body));
    }

    #[tokio::test]
    async fn test_limit_counts_utf16_units() {
        let (observer, blobs, _) = observer();
        let now = Instant::now();
        let at_limit = "\u{1F600}".repeat(INLINE_BODY_LIMIT / 2);
        let over_limit = "\u{1F600}".repeat(INLINE_BODY_LIMIT / 2 + 1);

        let inline = observer
            .log_success(&Method::GET, &uri(), None, StatusCode::OK, &at_limit, now, now)
            .await;
        assert_eq!(inline.response_body, Some(ResponseBody::Inline(at_limit)));
        assert!(blobs.is_empty());

        let offloaded = observer
            .log_success(&Method::GET, &uri(), None, StatusCode::OK, &over_limit, now, now)
            .await;
        assert!(matches!(offloaded.response_body, Some(ResponseBody::Blob(_))));
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_falls_back_inline() {
        let sink = Arc::new(Recorded::default());
        let observer = CallObserver::with_sink(Arc::new(BrokenStore), sink.clone());
        let body = "z".repeat(2500);
        let now = Instant::now();

        let record = observer
            .log_success(&Method::GET, &uri(), None, StatusCode::OK, &body, now, now)
            .await;

        assert_eq!(record.response_body, Some(ResponseBody::Inline(body)));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_request_body_omitted() {
        let (observer, _, _) = observer();
        let now = Instant::now();

        let record = observer
            .log_success(&Method::GET, &uri(), Some(""), StatusCode::OK, "[]", now, now)
            .await;

        assert_eq!(record.request_body, None);
    }

    #[test]
    fn test_failure_record_forces_zero_status() {
        let (observer, _, sink) = observer();
        let error = CallError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };

        let record = observer.log_failure(&Method::DELETE, &uri(), None, &error, Instant::now());

        assert_eq!(record.status_code, 0);
        assert_eq!(record.level, RecordLevel::Error);
        assert_eq!(record.error_kind, Some(ErrorKind::Network));
        assert!(record.error.as_deref().unwrap().contains("boom"));
        assert!(record.message().contains("responded 0 in"));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failure_record_is_not_emitted_until_asked() {
        let (observer, _, sink) = observer();

        let record =
            observer.failure_record(&Method::GET, &uri(), None, &CallError::Cancelled, Instant::now());

        assert!(sink.0.lock().unwrap().is_empty());
        observer.emit(&record);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }
}
