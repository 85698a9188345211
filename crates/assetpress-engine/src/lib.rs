//! Compression coordination for assetpress.
//!
//! The [`Coordinator`] answers every request from the job cache and never
//! waits for a compressor. On a miss it writes a `Processing` placeholder,
//! hands a [`JobSpec`] to a [`Dispatcher`], and serves the original text.
//! The background [`JobContext::run`] later replaces the placeholder with a
//! `Ready` or `Failed` record.

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod job;

pub use config::{EngineConfig, ExecutionStrategy};
pub use coordinator::{CompressRequest, Coordinator};
pub use dispatcher::{Dispatcher, ProcessDispatcher, TaskDispatcher, ThreadDispatcher, create_dispatcher};
pub use job::{JobContext, JobOutcome, JobSpec};
