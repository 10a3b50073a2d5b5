use crate::busy::BusyCounter;
use crate::classifier::{classify, ErrorRecord, ErrorReporter, FailureContext};
use crate::client::builder::RequestPipelineBuilder;
use crate::config::PipelineConfig;
use crate::envelope::{server_message, ResponseEnvelope, SuccessCodes};
use crate::registry::PendingRegistry;
use crate::request::{RequestDescriptor, RequestOptions};
use crate::session::CredentialSource;
use crate::transport::{Transport, TransportFailure, TransportRequest, TransportResponse};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Correlation id attached to every dispatch.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client that deduplicates in-flight requests, drives the shared busy
/// indicator and classifies every failure the same way.
///
/// Per call: `Idle → Dispatched → {Succeeded, Failed, Cancelled}`. The busy
/// count and the pending registration are both held by guards, so they are
/// released exactly once on every terminal path, including the caller dropping
/// the future.
#[derive(Clone)]
pub struct RequestPipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) success_codes: SuccessCodes,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) registry: Arc<PendingRegistry>,
    pub(crate) busy: Arc<BusyCounter>,
    pub(crate) credentials: Arc<dyn CredentialSource>,
    pub(crate) reporter: ErrorReporter,
}

enum Outcome {
    Response(TransportResponse),
    Failed(TransportFailure),
    Cancelled,
}

impl From<std::result::Result<TransportResponse, TransportFailure>> for Outcome {
    fn from(result: std::result::Result<TransportResponse, TransportFailure>) -> Self {
        match result {
            Ok(resp) => Outcome::Response(resp),
            Err(failure) => Outcome::Failed(failure),
        }
    }
}

impl RequestPipeline {
    /// Pipeline with environment configuration and default collaborators.
    pub fn new() -> Result<Self> {
        RequestPipelineBuilder::new().build()
    }

    pub fn builder() -> RequestPipelineBuilder {
        RequestPipelineBuilder::new()
    }

    /// GET with `params` as the query string.
    pub async fn get<T, Q>(&self, url: &str, params: &Q, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(Method::GET, url, params, options).await
    }

    /// POST with `data` as the JSON body.
    pub async fn post<T, D>(&self, url: &str, data: &D, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        self.request(Method::POST, url, data, options).await
    }

    /// PUT with `data` as the JSON body.
    pub async fn put<T, D>(&self, url: &str, data: &D, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        self.request(Method::PUT, url, data, options).await
    }

    /// DELETE with `params` as the query string.
    pub async fn delete<T, Q>(&self, url: &str, params: &Q, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(Method::DELETE, url, params, options).await
    }

    /// Raw call. `data` becomes the query for GET/DELETE/HEAD/OPTIONS and the
    /// JSON body otherwise; pass `&()` for none.
    pub async fn request<T, D>(
        &self,
        method: Method,
        url: &str,
        data: &D,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let descriptor = RequestDescriptor::new(method, url).with_data_value(serde_json::to_value(data)?);
        self.execute(&descriptor, options).await
    }

    /// Run a prepared descriptor and decode the unwrapped `data` into `T`.
    ///
    /// `data` that does not decode into `T` fails as a `Business` record
    /// without a notice.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        options: RequestOptions,
    ) -> Result<T> {
        let data = self.execute_value(descriptor, options).await?;
        serde_json::from_value(data).map_err(|e| {
            let record = classify(FailureContext::UndecodableData {
                url: descriptor.url(),
                detail: &e.to_string(),
            });
            self.reporter.report(&record, options.notify_on_error);
            Error::Request(record)
        })
    }

    /// Run a prepared descriptor and return the unwrapped `data` as JSON.
    pub async fn execute_value(
        &self,
        descriptor: &RequestDescriptor,
        options: RequestOptions,
    ) -> Result<Value> {
        let url = descriptor.url();
        if let Some(query) = descriptor.query().filter(|q| !q.is_object()) {
            return Err(Error::InvalidRequest(format!(
                "query for {} must be a JSON object, got {}",
                url, query
            )));
        }
        let request = TransportRequest {
            method: descriptor.method().clone(),
            url: url.to_string(),
            query: descriptor.query().cloned(),
            body: descriptor.body().cloned(),
            headers: self.outbound_headers(),
        };

        // Registering first cancels any colliding call before this one goes out.
        let pending = options.dedupe.then(|| self.registry.guard(descriptor));
        let busy = options.show_busy_indicator.then(|| self.busy.guard());

        let fingerprint = pending
            .as_ref()
            .map(|p| p.pending().fingerprint().to_string())
            .unwrap_or_default();
        debug!(
            method = %descriptor.method(),
            url,
            fingerprint = %fingerprint,
            busy_count = self.busy.count(),
            "dispatch"
        );

        let start = std::time::Instant::now();
        let outcome = match pending.as_ref().map(|p| p.token().clone()) {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Outcome::Cancelled,
                result = self.transport.send(request) => Outcome::from(result),
            },
            None => Outcome::from(self.transport.send(request).await),
        };

        if let Some(guard) = busy {
            guard.release();
        }
        if let Some(guard) = pending {
            guard.release();
        }

        let record = match outcome {
            Outcome::Response(resp) if resp.is_success() => {
                match self.unwrap_envelope(url, &resp.body) {
                    Ok(data) => {
                        info!(
                            method = %descriptor.method(),
                            url,
                            http_status = resp.status,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "request succeeded"
                        );
                        return Ok(data);
                    }
                    Err(record) => record,
                }
            }
            Outcome::Response(resp) => classify(FailureContext::HttpStatus {
                url,
                status: resp.status,
                server_message: server_message(&resp.body).as_deref(),
            }),
            Outcome::Failed(failure) => classify(FailureContext::NoResponse {
                url,
                message: &failure.message,
            }),
            Outcome::Cancelled => classify(FailureContext::Cancelled { url }),
        };

        self.reporter.report(&record, options.notify_on_error);
        Err(Error::Request(record))
    }

    /// Cancels every registered in-flight call (logout, hard navigation).
    /// Returns how many were cancelled.
    pub fn cancel_all_pending(&self) -> usize {
        self.registry.cancel_all()
    }

    pub fn pending_count(&self) -> usize {
        self.registry.pending_count()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy(&self) -> &Arc<BusyCounter> {
        &self.busy
    }

    pub fn registry(&self) -> &Arc<PendingRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn success_codes(&self) -> &SuccessCodes {
        &self.success_codes
    }

    fn unwrap_envelope(&self, url: &str, body: &[u8]) -> std::result::Result<Value, ErrorRecord> {
        let envelope: ResponseEnvelope = serde_json::from_slice(body).map_err(|e| {
            classify(FailureContext::MalformedEnvelope {
                url,
                detail: &e.to_string(),
            })
        })?;
        if envelope.is_success(&self.success_codes) {
            Ok(envelope.data)
        } else {
            Err(classify(FailureContext::Business {
                url,
                code: envelope.code,
                message: &envelope.message,
            }))
        }
    }

    fn outbound_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("credential token is not a valid header value; sending without it"),
            }
        }
        if let Ok(id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
        }
        headers
    }
}
