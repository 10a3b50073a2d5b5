use super::{query_pairs, Transport, TransportError, TransportFailure, TransportRequest, TransportResponse};
use crate::config::PipelineConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Proxy;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Self::new_with_base_url(config, None)
    }

    /// Like [`HttpTransport::new`] but with the base URL replaced (mock servers in tests).
    pub fn new_with_base_url(config: &PipelineConfig, base_url_override: Option<&str>) -> Result<Self> {
        let timeout = config.timeout();

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers(config)?)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            builder = builder.proxy(Proxy::all(proxy_url).map_err(TransportError::Http)?);
        }

        let client = builder.build().map_err(TransportError::Http)?;

        Ok(Self {
            client,
            base_url: base_url_override.unwrap_or(&config.base_url).to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; relative paths are joined onto the base URL.
    pub fn resolve_url(&self, path: &str) -> String {
        if self.base_url.is_empty() || path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn failure(&self, err: &reqwest::Error) -> TransportFailure {
        // Normalized so the classifier can tell expiry from connectivity by text.
        let message = if err.is_timeout() {
            format!("timeout of {}ms exceeded: {}", self.timeout.as_millis(), err)
        } else if err.is_connect() {
            format!("Network Error: {}", err)
        } else {
            err.to_string()
        };
        TransportFailure::new(message)
    }
}

fn default_headers(config: &PipelineConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.default_headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportFailure> {
        let resolved = self.resolve_url(&request.url);
        let url = Url::parse(&resolved)
            .map_err(|e| TransportFailure::new(format!("invalid URL '{}': {}", resolved, e)))?;

        let mut req = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(query) = &request.query {
            let pairs = query_pairs(query)
                .ok_or_else(|| TransportFailure::new("query must be a JSON object"))?;
            req = req.query(&pairs);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| self.failure(&e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.failure(&e))?;

        debug!(method = %request.method, url = %resolved, http_status = status, "response received");
        Ok(TransportResponse { status, body })
    }
}
