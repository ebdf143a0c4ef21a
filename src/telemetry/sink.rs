use tracing::{debug, error};

use super::record::{CallRecord, RecordLevel, ResponseBody};

/// Destination for finished call records.
pub trait RecordSink: Send + Sync {
    fn emit(&self, record: &CallRecord);
}

/// Emits each record as one `tracing` event: `debug` for successes,
/// `error` for failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, record: &CallRecord) {
        let request_body = record.request_body.as_deref();
        let response_body = record.response_body.as_ref().map(ResponseBody::as_str);

        match record.level {
            RecordLevel::Debug => debug!(
                dependency = %record.dependency,
                request_method = %record.request_method,
                request_path = %record.request_path,
                status_code = record.status_code,
                elapsed = record.elapsed_ms,
                request_body,
                response_body,
                "{}",
                record.message()
            ),
            RecordLevel::Error => error!(
                dependency = %record.dependency,
                request_method = %record.request_method,
                request_path = %record.request_path,
                status_code = record.status_code,
                elapsed = record.elapsed_ms,
                request_body,
                error = record.error.as_deref(),
                "{}",
                record.message()
            ),
        }
    }
}
