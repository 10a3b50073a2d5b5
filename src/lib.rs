//! # request-pipeline
//!
//! 移动端 H5 应用的 HTTP 请求管线：重复请求去重、全局 loading 计数与统一错误处理。
//!
//! HTTP request pipeline for mobile web backends.
//!
//! ## Overview
//!
//! Every outbound call goes through the same steps:
//!
//! 1. attach the bearer token from the [`session::CredentialSource`]
//! 2. register its fingerprint, cancelling an identical call still in flight
//! 3. enter the shared busy counter (unless the call opted out)
//! 4. send through the [`transport::Transport`]
//! 5. exit the busy counter and release the registration, on every path
//! 6. unwrap the `{code, data, message}` envelope, or classify the failure and
//!    notify the user
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use request_pipeline::{PipelineConfig, RequestOptions, RequestPipeline};
//! use request_pipeline::session::InMemoryCredentialStore;
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     username: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> request_pipeline::Result<()> {
//!     let pipeline = RequestPipeline::builder()
//!         .config(PipelineConfig::new().with_base_url("https://api.example.com"))
//!         .credentials(Arc::new(InMemoryCredentialStore::with_token("token")))
//!         .build()?;
//!
//!     let user: User = pipeline.get("/user/1", &(), RequestOptions::default()).await?;
//!     println!("{} {}", user.id, user.username);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | The pipeline and its builder |
//! | [`registry`] | Fingerprints and in-flight deduplication |
//! | [`busy`] | Shared busy-state counter |
//! | [`classifier`] | Failure taxonomy, classification and reporting |
//! | [`envelope`] | `{code, data, message}` and paging wire types |
//! | [`transport`] | Transport seam and the `reqwest` implementation |
//! | [`config`] | Pipeline configuration |
//! | [`session`] | Credential sources |
//! | [`notify`] | Notification and navigation sinks |

pub mod busy;
pub mod classifier;
pub mod client;
pub mod config;
pub mod envelope;
pub mod notify;
pub mod registry;
pub mod request;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use busy::{BusyCounter, BusyObserver};
pub use classifier::{ErrorKind, ErrorRecord};
pub use client::{RequestPipeline, RequestPipelineBuilder};
pub use config::PipelineConfig;
pub use envelope::{PageData, PageParams, ResponseEnvelope, SuccessCodes};
pub use request::{RequestDescriptor, RequestOptions};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
