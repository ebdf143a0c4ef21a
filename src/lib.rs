//! Single-shot call/decode/observe pipeline for a REST accounting API.
//!
//! A caller hands a [`RequestDescriptor`] to a [`RequestHandler`], which
//! issues it through an [`HttpClient`], extracts the (optionally gzipped)
//! JSON payload into a typed [`Entity`], and records one [`CallRecord`] for
//! the call whether it succeeded or failed.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod handler;
pub mod infra;
pub mod telemetry;

pub use config::PipelineConfig;
pub use error::{CallError, ErrorKind};
pub use extract::{ETagSupport, Entity, Extracted, ResponseEnvelope};
pub use fetch::{BasicClient, HttpClient, RequestDescriptor};
pub use handler::RequestHandler;
pub use telemetry::{CallObserver, CallRecord, RecordSink, TracingSink};
