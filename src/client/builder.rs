use crate::busy::{BusyCounter, BusyObserver};
use crate::classifier::ErrorReporter;
use crate::client::core::RequestPipeline;
use crate::config::PipelineConfig;
use crate::notify::{Navigator, NotificationSink, TracingNavigator, TracingNotificationSink};
use crate::registry::PendingRegistry;
use crate::session::{CredentialSource, NoCredentials};
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;

/// Builder for creating pipelines with custom collaborators.
///
/// Keep this surface area small and predictable (developer-friendly).
pub struct RequestPipelineBuilder {
    config: Option<PipelineConfig>,
    transport: Option<Arc<dyn Transport>>,
    credentials: Arc<dyn CredentialSource>,
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    busy: Option<Arc<BusyCounter>>,
    busy_observers: Vec<Arc<dyn BusyObserver>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl RequestPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            transport: None,
            credentials: Arc::new(NoCredentials),
            notifier: Arc::new(TracingNotificationSink),
            navigator: Arc::new(TracingNavigator),
            busy: None,
            busy_observers: Vec::new(),
            base_url_override: None,
        }
    }

    /// Use this configuration instead of defaults plus environment overrides.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the HTTP transport (scripted transports in tests, custom stacks).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifier = sink;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Share a busy counter with other pipelines (one indicator for the whole app).
    pub fn busy_counter(mut self, counter: Arc<BusyCounter>) -> Self {
        self.busy = Some(counter);
        self
    }

    pub fn busy_observer(mut self, observer: Arc<dyn BusyObserver>) -> Self {
        self.busy_observers.push(observer);
        self
    }

    /// Override the configured base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<RequestPipeline> {
        let config = self.config.unwrap_or_else(PipelineConfig::from_env);
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new_with_base_url(
                &config,
                self.base_url_override.as_deref(),
            )?),
        };

        let busy = self.busy.unwrap_or_else(|| Arc::new(BusyCounter::new()));
        for observer in self.busy_observers {
            busy.add_observer(observer);
        }

        let reporter = ErrorReporter::new(
            config.allow_list(),
            self.notifier,
            self.credentials.clone(),
            self.navigator,
        )
        .with_login_path(config.login_path.clone())
        .with_redirect_delay(config.redirect_delay());

        Ok(RequestPipeline {
            success_codes: config.success_code_set(),
            config,
            transport,
            registry: Arc::new(PendingRegistry::new()),
            busy,
            credentials: self.credentials,
            reporter,
        })
    }
}

impl Default for RequestPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
