//! Mutex used to guard timer queue state.
//!
//! The queue keeps its event container, ordering counters, soft-delay floor and
//! consumer count behind a single lock. That lock is `parking_lot`'s mutex:
//!
//! - No poisoning, so a panicking event cannot wedge the queue
//! - Compact and fast to acquire in the uncontended case
//! - Guards work with [`Condvar`](crate::Condvar) directly
//!
//! # Examples
//!
//! ```
//! use prometheus_timer_queue::Mutex;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let pending = Arc::new(Mutex::new(Vec::new()));
//! let mut handles = vec![];
//!
//! for i in 0..4 {
//!     let pending = Arc::clone(&pending);
//!     handles.push(thread::spawn(move || pending.lock().push(i)));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(pending.lock().len(), 4);
//! ```

pub use parking_lot::{Mutex, MutexGuard};
