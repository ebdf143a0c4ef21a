//! Outbound side of the pipeline: request descriptors and the transport.

mod basic;
mod client;
pub mod compression;
mod request;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use request::RequestDescriptor;
