//! Request pipeline client.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;

pub use builder::RequestPipelineBuilder;
pub use core::RequestPipeline;
