//! Core queue engine: deadlines, the event container, the timer queue,
//! consumer handles, the call-bridge and the dispatch loop.

mod bridge;
pub mod container;
pub mod deadline;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod timer_queue;

pub use container::{EventContainer, TimedItem};
pub use deadline::{Deadline, TICK};
pub use dispatch::{run_consumer, spawn_consumer, spawn_consumers, DispatchStats};
pub use error::{AppResult, QueueError};
pub use handle::QueueHandle;
pub use timer_queue::{DeadlineBypass, Event, TimerQueue};
