//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use request_pipeline::busy::BusyObserver;
use request_pipeline::notify::{InMemoryNavigator, InMemoryNotificationSink};
use request_pipeline::session::InMemoryCredentialStore;
use request_pipeline::transport::{Transport, TransportFailure, TransportRequest, TransportResponse};
use request_pipeline::{PipelineConfig, RequestPipeline};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// What the scripted transport answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Failure(String),
}

impl Reply {
    /// `{code, data, message}` envelope with HTTP 200.
    pub fn envelope(code: i64, data: Value, message: &str) -> Self {
        Reply::Status(
            200,
            json!({"code": code, "data": data, "message": message}).to_string(),
        )
    }

    pub fn ok(data: Value) -> Self {
        Self::envelope(200, data, "")
    }
}

struct Step {
    gate: Option<Arc<Notify>>,
    reply: Reply,
}

/// Transport that answers from a queue of scripted replies, in arrival order.
///
/// A gated step waits for its [`Notify`] before answering, which keeps a call
/// in flight for as long as a test needs.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    fallback: Mutex<Option<Reply>>,
    received: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Reply) {
        self.steps.lock().unwrap().push_back(Step { gate: None, reply });
    }

    /// Queue a reply that is held back until the returned gate is notified.
    pub fn push_gated(&self, reply: Reply) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.steps.lock().unwrap().push_back(Step {
            gate: Some(gate.clone()),
            reply,
        });
        gate
    }

    /// Reply used once the queue is empty.
    pub fn set_fallback(&self, reply: Reply) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    pub fn received(&self) -> Vec<TransportRequest> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportFailure> {
        self.received.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        let (gate, reply) = match step {
            Some(step) => (step.gate, step.reply),
            None => (
                None,
                self.fallback
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Reply::Failure("no scripted reply".to_string())),
            ),
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match reply {
            Reply::Status(status, body) => Ok(TransportResponse::new(status, body)),
            Reply::Failure(message) => Err(TransportFailure::new(message)),
        }
    }
}

/// Records busy/idle transitions in order.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl BusyObserver for RecordingObserver {
    fn on_busy(&self) {
        self.events.lock().unwrap().push("busy");
    }

    fn on_idle(&self) {
        self.events.lock().unwrap().push("idle");
    }
}

pub struct Harness {
    pub pipeline: RequestPipeline,
    pub transport: Arc<ScriptedTransport>,
    pub notifications: Arc<InMemoryNotificationSink>,
    pub navigator: Arc<InMemoryNavigator>,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub observer: Arc<RecordingObserver>,
}

pub fn harness() -> Harness {
    harness_with(PipelineConfig::new().with_redirect_delay(Duration::from_millis(20)))
}

pub fn harness_with(config: PipelineConfig) -> Harness {
    let transport = ScriptedTransport::new();
    let notifications = Arc::new(InMemoryNotificationSink::default());
    let navigator = Arc::new(InMemoryNavigator::new());
    let credentials = Arc::new(InMemoryCredentialStore::with_token("token-abc"));
    let observer = Arc::new(RecordingObserver::default());

    let pipeline = RequestPipeline::builder()
        .config(config)
        .transport(transport.clone())
        .notification_sink(notifications.clone())
        .navigator(navigator.clone())
        .credentials(credentials.clone())
        .busy_observer(observer.clone())
        .build()
        .expect("pipeline builds");

    Harness {
        pipeline,
        transport,
        notifications,
        navigator,
        credentials,
        observer,
    }
}
