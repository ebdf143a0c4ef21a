//! Call telemetry.
//!
//! Every call produces exactly one [`CallRecord`], assembled in full by the
//! [`CallObserver`] and handed whole to a [`RecordSink`]. The default sink,
//! [`TracingSink`], emits the record as a single `tracing` event.

mod observer;
mod record;
mod sink;

pub use observer::{CallObserver, INLINE_BODY_LIMIT, LOG_CONTAINER, elapsed_ms};
pub use record::{CallRecord, DEPENDENCY, MESSAGE_TEMPLATE, RecordLevel, ResponseBody};
pub use sink::{RecordSink, TracingSink};
