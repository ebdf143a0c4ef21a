//! Call orchestration.
//!
//! [`RequestHandler`] runs every call through one core: issue the request,
//! extract the response, record the outcome. Two adapters sit on top of it:
//!
//! - callback mode ([`RequestHandler::begin_request`] /
//!   [`RequestHandler::handle_response`]): the outcome is delivered to an
//!   `on_complete` or `on_error` closure. Success is recorded before
//!   `on_complete` runs; on failure `on_error` runs first and the failure
//!   record is emitted after it.
//! - awaitable mode ([`RequestHandler::get_response`] and friends): the
//!   outcome is returned. Failures are recorded and collapse into
//!   [`ResponseEnvelope::sentinel`].

use reqwest::{StatusCode, Url};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{CallError, Result};
use crate::extract::{Entity, Extracted, ResponseEnvelope, extract};
use crate::fetch::{HttpClient, RequestDescriptor};
use crate::infra::blob::S3BlobStore;
use crate::telemetry::CallObserver;

pub struct RequestHandler<C> {
    client: C,
    observer: CallObserver,
}

impl<C: HttpClient> RequestHandler<C> {
    pub fn new(client: C, observer: CallObserver) -> Self {
        Self { client, observer }
    }

    /// Handler that offloads large bodies to S3 and logs through `tracing`.
    pub async fn from_config(client: C, config: &PipelineConfig) -> Self {
        let blobs = S3BlobStore::connect(&config.storage).await;
        Self::new(client, CallObserver::new(Arc::new(blobs)))
    }

    pub fn observer(&self) -> &CallObserver {
        &self.observer
    }

    /// Issues `request`, extracts the response and records the success.
    ///
    /// Errors are returned unrecorded; each adapter records them in its own
    /// order.
    async fn issue_and_complete<T: Entity>(
        &self,
        request: &RequestDescriptor,
        start: Instant,
    ) -> Result<Extracted<T>> {
        let response = self.client.execute(request.to_request()).await?;
        let extracted = extract::<T>(response).await?;
        let finish = Instant::now();

        self.observer
            .log_success(
                request.method(),
                request.uri(),
                request.body(),
                extracted.status,
                &extracted.raw_body,
                start,
                finish,
            )
            .await;

        Ok(extracted)
    }

    /// Runs one call and delivers its outcome to exactly one of the two
    /// closures.
    #[tracing::instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    pub async fn handle_response<T, F, E>(&self, request: &RequestDescriptor, on_complete: F, on_error: E)
    where
        T: Entity,
        F: FnOnce(StatusCode, Option<String>, Option<T>),
        E: FnOnce(&Url, CallError),
    {
        let start = Instant::now();

        match self.issue_and_complete::<T>(request, start).await {
            Ok(extracted) => on_complete(extracted.status, extracted.location, extracted.entity),
            Err(err) => {
                let record = self.observer.failure_record(
                    request.method(),
                    request.uri(),
                    request.body(),
                    &err,
                    start,
                );
                on_error(request.uri(), err);
                self.observer.emit(&record);
            }
        }
    }

    /// Awaitable call. Failures are recorded and returned as the sentinel
    /// envelope.
    pub async fn get_response<T: Entity>(&self, request: &RequestDescriptor) -> ResponseEnvelope<T> {
        self.get_response_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Like [`get_response`](Self::get_response), but `cancel` aborts the
    /// wait on the network call or the blob upload.
    pub async fn get_response_with_cancellation<T: Entity>(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ResponseEnvelope<T> {
        match self.try_get_response(request, cancel).await {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(error = %err, "Call failed, returning empty envelope");
                ResponseEnvelope::sentinel()
            }
        }
    }

    /// Awaitable call that hands the error back after recording it.
    #[tracing::instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    pub async fn try_get_response<T: Entity>(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<T>> {
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            result = self.issue_and_complete::<T>(request, start) => result,
        };

        match outcome {
            Ok(extracted) => Ok(extracted.into()),
            Err(err) => {
                self.observer.log_failure(
                    request.method(),
                    request.uri(),
                    request.body(),
                    &err,
                    start,
                );
                Err(err)
            }
        }
    }
}

impl<C: HttpClient + 'static> RequestHandler<C> {
    /// Callback mode: spawns the call on the runtime and returns immediately.
    /// The closures run on a runtime worker once the call completes.
    pub fn begin_request<T, F, E>(
        self: &Arc<Self>,
        request: RequestDescriptor,
        on_complete: F,
        on_error: E,
    ) -> JoinHandle<()>
    where
        T: Entity,
        F: FnOnce(StatusCode, Option<String>, Option<T>) + Send + 'static,
        E: FnOnce(&Url, CallError) + Send + 'static,
    {
        let handler = Arc::clone(self);
        tokio::spawn(async move {
            handler
                .handle_response(&request, on_complete, on_error)
                .await;
        })
    }
}
