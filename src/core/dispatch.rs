//! Consumer dispatch loop and thread spawning.
//!
//! A consumer blocks on [`TimerQueue::wait_pop`] and runs each event as it
//! becomes due. Panicking events are caught and logged so one bad event does
//! not take the consumer down; bridged producers waiting on such an event
//! receive a failure result.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::{QueueError, QueueHandle, TimerQueue};

/// Counters reported by a consumer when its loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events that ran to completion.
    pub executed: u64,
    /// Events that panicked.
    pub panicked: u64,
}

impl DispatchStats {
    /// Total events taken from the queue.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.executed + self.panicked
    }
}

impl std::ops::Add for DispatchStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            executed: self.executed + rhs.executed,
            panicked: self.panicked + rhs.panicked,
        }
    }
}

/// Run events from `handle`'s queue until it shuts down.
///
/// `args` produces the argument passed to each event. The event's return
/// value is discarded.
pub fn run_consumer<A, R, F>(handle: QueueHandle<'_, A, R>, mut args: F) -> DispatchStats
where
    F: FnMut() -> A,
{
    let mut stats = DispatchStats::default();
    debug!(queue = %handle.name(), "consumer started");

    while let Some(event) = handle.wait_pop() {
        let input = args();
        match panic::catch_unwind(AssertUnwindSafe(move || event(input))) {
            Ok(_) => stats.executed += 1,
            Err(payload) => {
                stats.panicked += 1;
                error!(
                    queue = %handle.name(),
                    panic = panic_message(payload.as_ref()),
                    "event panicked"
                );
            }
        }
    }

    debug!(
        queue = %handle.name(),
        executed = stats.executed,
        panicked = stats.panicked,
        "consumer stopped"
    );
    stats
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Spawn a named consumer thread for `queue`.
///
/// The consumer is registered before the thread starts, so a
/// [`TimerQueue::shutdown_and_wait`] issued right after this returns already
/// waits for it.
///
/// # Errors
///
/// Returns [`QueueError::Spawn`] if the OS refuses to create the thread.
pub fn spawn_consumer<R>(
    queue: &Arc<TimerQueue<(), R>>,
    index: usize,
) -> Result<JoinHandle<DispatchStats>, QueueError>
where
    R: 'static,
{
    let handle = QueueHandle::shared(Arc::clone(queue));
    let name = format!("tq-{}-{index}", queue.name());
    let join = thread::Builder::new()
        .name(name)
        .spawn(move || run_consumer(handle, || ()))?;
    Ok(join)
}

/// Spawn [`TimerQueue::consumer_threads`] consumer threads.
///
/// # Errors
///
/// Returns [`QueueError::Spawn`] on the first thread that fails to start.
/// Threads already started keep running until the queue shuts down.
pub fn spawn_consumers<R>(
    queue: &Arc<TimerQueue<(), R>>,
) -> Result<Vec<JoinHandle<DispatchStats>>, QueueError>
where
    R: 'static,
{
    (0..queue.consumer_threads())
        .map(|index| spawn_consumer(queue, index))
        .collect()
}
