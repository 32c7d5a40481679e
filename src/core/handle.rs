//! Consumer registration guard.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::TimerQueue;

enum Binding<'q, A, R> {
    Borrowed(&'q TimerQueue<A, R>),
    Shared(Arc<TimerQueue<A, R>>),
}

/// A consumer's registration with a [`TimerQueue`].
///
/// While a handle exists the queue counts it as a live consumer, and
/// [`TimerQueue::shutdown_and_wait`] (and therefore dropping the queue) blocks
/// until it is released. Handles are move-only; moving one transfers the
/// registration and only the final owner releases it.
///
/// A borrowed handle ties its lifetime to the queue, which suits scoped
/// threads. [`QueueHandle::shared`] keeps the queue alive through an [`Arc`]
/// for threads that outlive the current scope.
///
/// The handle dereferences to the queue.
pub struct QueueHandle<'q, A = (), R = ()> {
    binding: Binding<'q, A, R>,
}

impl<'q, A, R> QueueHandle<'q, A, R> {
    /// Register a consumer on a borrowed queue.
    pub fn new(queue: &'q TimerQueue<A, R>) -> Self {
        queue.acquire_consumer();
        Self {
            binding: Binding::Borrowed(queue),
        }
    }

    /// The queue this handle is registered with.
    pub fn queue(&self) -> &TimerQueue<A, R> {
        match &self.binding {
            Binding::Borrowed(queue) => *queue,
            Binding::Shared(queue) => queue.as_ref(),
        }
    }

    /// Release the registration now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl<A, R> QueueHandle<'static, A, R> {
    /// Register a consumer on a shared queue.
    pub fn shared(queue: Arc<TimerQueue<A, R>>) -> Self {
        queue.acquire_consumer();
        Self {
            binding: Binding::Shared(queue),
        }
    }
}

impl<A, R> Deref for QueueHandle<'_, A, R> {
    type Target = TimerQueue<A, R>;

    fn deref(&self) -> &TimerQueue<A, R> {
        self.queue()
    }
}

impl<A, R> Drop for QueueHandle<'_, A, R> {
    fn drop(&mut self) {
        self.queue().release_consumer();
    }
}

impl<A, R> fmt::Debug for QueueHandle<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueHandle")
            .field("queue", &self.queue().name())
            .field("shared", &matches!(self.binding, Binding::Shared(_)))
            .finish()
    }
}
