//! # Prometheus Timer Queue
//!
//! A thread-safe, deadline-ordered event queue for the Prometheus AI Platform.
//!
//! Producers submit callables tagged with when they should run; consumer
//! threads block until the earliest deadline arrives, then take and execute
//! the event. The queue is a coordination primitive rather than an executor:
//! it owns no threads unless asked to spawn consumers.
//!
//! ## Scheduling Classes
//!
//! - **At / In**: run at an absolute instant, or a duration from the call
//! - **Soon**: run now (plus an optional base delay), or on the soft-delay floor
//!   when one is active
//! - **Urgent**: run ahead of everything scheduled on the clock, FIFO among
//!   urgent events
//! - **Batch**: any of the above for a sequence, preserving input order
//!
//! ## Consumers and Shutdown
//!
//! Consumers register through a [`QueueHandle`]. [`TimerQueue::shutdown`]
//! stops delivery immediately (pending events are never handed out after it)
//! and [`TimerQueue::shutdown_and_wait`], which dropping the queue also runs,
//! blocks until every handle has been released and then discards whatever is
//! still pending.
//!
//! ```
//! use prometheus_timer_queue::{run_consumer, QueueHandle, TimerQueue};
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
//! let handle = QueueHandle::shared(Arc::clone(&queue));
//! let consumer = thread::spawn(move || run_consumer(handle, || ()));
//!
//! assert!(queue.schedule_in(Duration::from_millis(10), |()| println!("later")));
//! assert!(queue.schedule_urgent(|()| println!("first")));
//!
//! // Runs on the consumer thread; the caller blocks for the result.
//! assert_eq!(queue.synchronize(|()| 6 * 7), Some(42));
//!
//! queue.shutdown_and_wait();
//! consumer.join().unwrap();
//! ```
//!
//! ## Call-Bridge
//!
//! [`TimerQueue::synchronize`] runs a closure on whichever consumer takes it
//! next and blocks the caller until it finishes. The caller gets `None` rather
//! than hanging if the closure panics or the queue drops it unexecuted.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Condition variable with deadline-bounded waits.
pub mod condvar;
/// Configuration models for timer queues.
pub mod config;
/// The queue engine and its collaborators.
pub mod core;
/// Mutex guarding queue state.
pub mod mutex;
/// Shared utilities.
pub mod util;

pub use crate::condvar::Condvar;
pub use crate::config::QueueConfig;
pub use crate::core::{
    run_consumer, spawn_consumer, spawn_consumers, AppResult, Deadline, DeadlineBypass,
    DispatchStats, Event, EventContainer, QueueError, QueueHandle, TimedItem, TimerQueue, TICK,
};
pub use crate::mutex::{Mutex, MutexGuard};
