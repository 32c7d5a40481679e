//! Configuration models for timer queues.

pub mod queue;

pub use queue::{QueueConfig, MAX_BASE_DELAY_MS};
