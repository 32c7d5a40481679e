//! Deadline-ordered event queue shared by producer and consumer threads.
//!
//! # Design
//!
//! - One mutex guards the container, the urgent sequence, the delay floor and
//!   the consumer count; there is no lock-free fast path
//! - Consumers park on a condvar, bounded by the earliest deadline when one exists
//! - The shutdown flag is written under the lock and mirrored in an atomic so
//!   `is_open` can be polled without locking

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::config::QueueConfig;
use crate::{Condvar, Mutex, MutexGuard};

use super::bridge::{self, Promise, Settle};
use super::{Deadline, EventContainer, QueueError, QueueHandle, TICK};

/// A queued unit of work.
///
/// The consumer supplies the argument `A` when it runs the event and receives
/// `R` back. Both default to `()`.
pub type Event<A = (), R = ()> = Box<dyn FnOnce(A) -> R + Send + 'static>;

struct State<A, R> {
    events: EventContainer<Event<A, R>>,
    next_urgent: u64,
    delay_until: Option<Instant>,
    consumers: usize,
}

impl<A, R> State<A, R> {
    /// Hand out the active delay floor, advancing it by one tick.
    fn take_floor(&mut self, now: Instant) -> Option<Deadline> {
        match self.delay_until {
            Some(floor) if now < floor => {
                self.delay_until = Some(floor.checked_add(TICK).unwrap_or(floor));
                Some(Deadline::Scheduled(floor))
            }
            _ => None,
        }
    }
}

/// Thread-safe queue delivering events when their deadline arrives.
///
/// Producers insert with [`schedule_at`](Self::schedule_at),
/// [`schedule_in`](Self::schedule_in), [`schedule`](Self::schedule) or
/// [`schedule_urgent`](Self::schedule_urgent). Consumers hold a
/// [`QueueHandle`] and loop on [`wait_pop`](Self::wait_pop) until it returns
/// `None`.
///
/// ```
/// use prometheus_timer_queue::TimerQueue;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// let queue: TimerQueue = TimerQueue::new();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// thread::scope(|s| {
///     let handle = queue.handle();
///     s.spawn(move || {
///         while let Some(event) = handle.wait_pop() {
///             event(());
///         }
///     });
///
///     let counter = Arc::clone(&hits);
///     assert!(queue.schedule_in(Duration::from_millis(5), move |()| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }));
///     assert_eq!(queue.synchronize(|()| 42), Some(42));
///     queue.shutdown();
/// });
/// ```
///
/// Dropping the queue shuts it down and blocks until every handle is released.
pub struct TimerQueue<A = (), R = ()> {
    name: String,
    base_delay: Duration,
    soft_delay: bool,
    consumer_threads: usize,
    state: Mutex<State<A, R>>,
    /// Signalled on insertion and shutdown.
    available: Condvar,
    /// Signalled when a handle is released.
    released: Condvar,
    shutdown: AtomicBool,
}

impl<A, R> Default for TimerQueue<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for TimerQueue<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("name", &self.name)
            .field("base_delay", &self.base_delay)
            .field("soft_delay", &self.soft_delay)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl<A, R> TimerQueue<A, R> {
    /// Create a queue with default configuration: no base delay, soft delay enabled.
    #[must_use]
    pub fn new() -> Self {
        let cfg = QueueConfig::default();
        Self::build(&cfg, cfg.base_delay())
    }

    /// Create a queue whose "soon" insertions are offset by `base_delay`.
    #[must_use]
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self::build(&QueueConfig::default(), base_delay)
    }

    /// Create a queue from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] if `cfg` fails validation.
    pub fn from_config(cfg: &QueueConfig) -> Result<Self, QueueError> {
        cfg.validate().map_err(QueueError::InvalidConfig)?;
        Ok(Self::build(cfg, cfg.base_delay()))
    }

    fn build(cfg: &QueueConfig, base_delay: Duration) -> Self {
        info!(
            queue = %cfg.name,
            ?base_delay,
            soft_delay = cfg.soft_delay,
            "timer queue created"
        );
        Self {
            name: cfg.name.clone(),
            base_delay,
            soft_delay: cfg.soft_delay,
            consumer_threads: cfg.consumer_threads.max(1),
            state: Mutex::new(State {
                events: EventContainer::new(),
                next_urgent: 0,
                delay_until: None,
                consumers: 0,
            }),
            available: Condvar::new(),
            released: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Queue name used in logs and thread names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset applied to "soon" insertions outside an active delay floor.
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Whether [`set_delay_until`](Self::set_delay_until) is available.
    pub const fn soft_delay_enabled(&self) -> bool {
        self.soft_delay
    }

    /// Consumer threads started by [`spawn_consumers`](super::spawn_consumers).
    pub const fn consumer_threads(&self) -> usize {
        self.consumer_threads
    }

    /// Lock-free liveness hint: `false` once shut down.
    pub fn is_open(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }

    /// Number of pending events, including undeliverable ones after shutdown.
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    /// Number of live [`QueueHandle`]s.
    pub fn consumers(&self) -> usize {
        self.state.lock().consumers
    }

    /// Current delay floor, if one has been set.
    pub fn delay_until(&self) -> Option<Instant> {
        self.state.lock().delay_until
    }

    /// Register a consumer and return its handle.
    pub fn handle(&self) -> QueueHandle<'_, A, R> {
        QueueHandle::new(self)
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Run `insert` under the lock unless the queue is shut down.
    ///
    /// On rejection the closure, and the event it owns, is dropped after the
    /// lock is released.
    fn admit(&self, insert: impl FnOnce(&mut State<A, R>)) -> bool {
        let mut state = self.state.lock();
        let added = self.is_open();
        if added {
            insert(&mut *state);
        }
        drop(state);

        if added {
            self.available.notify_all();
        } else {
            debug!(queue = %self.name, "insertion rejected, queue is shut down");
        }
        added
    }

    fn insert(&self, deadline: Deadline, event: Event<A, R>) -> bool {
        self.admit(|state| state.events.push(deadline, event))
    }

    fn insert_batch(&self, events: Vec<(Deadline, Event<A, R>)>) -> bool {
        self.admit(|state| state.events.extend(events))
    }

    /// Queue `event` to run at `at`.
    ///
    /// Returns `false`, dropping the event, if the queue is shut down.
    #[must_use = "a `false` return means the event was dropped"]
    pub fn schedule_at<F>(&self, at: Instant, event: F) -> bool
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        self.insert(Deadline::Scheduled(at), Box::new(event))
    }

    /// Queue `event` to run `delay` from now. The deadline is fixed at call time.
    ///
    /// A delay too large for [`Instant`] queues the event with
    /// [`Deadline::Never`]: it is held but never delivered by deadline.
    #[must_use = "a `false` return means the event was dropped"]
    pub fn schedule_in<F>(&self, delay: Duration, event: F) -> bool
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        self.insert(Deadline::after(Instant::now(), delay), Box::new(event))
    }

    /// Queue `event` to run as soon as possible.
    ///
    /// While a delay floor is active the event lands on the floor, which then
    /// moves one tick forward; otherwise it runs at `now + base_delay`.
    #[must_use = "a `false` return means the event was dropped"]
    pub fn schedule<F>(&self, event: F) -> bool
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        let now = Instant::now();
        let event: Event<A, R> = Box::new(event);
        self.admit(|state| {
            let deadline = state
                .take_floor(now)
                .unwrap_or_else(|| Deadline::after(now, self.base_delay));
            state.events.push(deadline, event);
        })
    }

    /// Queue `event` ahead of every clock-scheduled event.
    ///
    /// Urgent events keep submission order among themselves.
    #[must_use = "a `false` return means the event was dropped"]
    pub fn schedule_urgent<F>(&self, event: F) -> bool
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        let event: Event<A, R> = Box::new(event);
        self.admit(|state| {
            let seq = state.next_urgent;
            state.next_urgent += 1;
            state.events.push(Deadline::Immediate(seq), event);
        })
    }

    /// Queue several events "soon", preserving their order.
    ///
    /// Each event gets the next floor slot while a delay floor is active;
    /// otherwise they start at `now + base_delay`, one tick apart. The
    /// iterator is drained before the queue lock is taken.
    #[must_use = "a `false` return means the events were dropped"]
    pub fn schedule_batch<I>(&self, events: I) -> bool
    where
        I: IntoIterator<Item = Event<A, R>>,
    {
        let events: Vec<Event<A, R>> = events.into_iter().collect();
        let now = Instant::now();
        self.admit(|state| {
            state.events.reserve(events.len());
            let mut next = Deadline::after(now, self.base_delay);
            for event in events {
                let deadline = state.take_floor(now).unwrap_or_else(|| {
                    let deadline = next;
                    if let Some(at) = next.instant() {
                        next = Deadline::after(at, TICK);
                    }
                    deadline
                });
                state.events.push(deadline, event);
            }
        })
    }

    /// Queue several events at their given instants.
    #[must_use = "a `false` return means the events were dropped"]
    pub fn schedule_batch_at<I>(&self, events: I) -> bool
    where
        I: IntoIterator<Item = (Instant, Event<A, R>)>,
    {
        let events = events
            .into_iter()
            .map(|(at, event)| (Deadline::Scheduled(at), event))
            .collect();
        self.insert_batch(events)
    }

    /// Queue several events at offsets from `t0`.
    ///
    /// Events with equal offsets keep their input order. Offsets too large
    /// for [`Instant`] queue the event with [`Deadline::Never`].
    #[must_use = "a `false` return means the events were dropped"]
    pub fn schedule_batch_in_from<I>(&self, t0: Instant, events: I) -> bool
    where
        I: IntoIterator<Item = (Duration, Event<A, R>)>,
    {
        let events = events
            .into_iter()
            .map(|(offset, event)| (Deadline::after(t0, offset), event))
            .collect();
        self.insert_batch(events)
    }

    /// Queue several events at offsets from now.
    #[must_use = "a `false` return means the events were dropped"]
    pub fn schedule_batch_in<I>(&self, events: I) -> bool
    where
        I: IntoIterator<Item = (Duration, Event<A, R>)>,
    {
        self.schedule_batch_in_from(Instant::now(), events)
    }

    /// Raise the delay floor for "soon" insertions to `at`.
    ///
    /// The floor never moves backward: an `at` earlier than the current floor
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::SoftDelayDisabled`] if the queue was configured
    /// without soft delay.
    pub fn set_delay_until(&self, at: Instant) -> Result<(), QueueError> {
        if !self.soft_delay {
            return Err(QueueError::SoftDelayDisabled(self.name.clone()));
        }
        let mut state = self.state.lock();
        if state.delay_until.is_none_or(|floor| floor < at) {
            state.delay_until = Some(at);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// Wait until the earliest event is due. Returns `false` on shutdown.
    fn wait_until_due(&self, state: &mut MutexGuard<'_, State<A, R>>) -> bool {
        loop {
            if !self.is_open() {
                return false;
            }
            match state.events.peek_deadline() {
                None => self.available.wait(state),
                Some(deadline) => {
                    if deadline.is_due(Instant::now()) {
                        return true;
                    }
                    match deadline.instant() {
                        Some(at) => {
                            self.available.wait_until(state, at);
                        }
                        None => self.available.wait(state),
                    }
                }
            }
        }
    }

    /// Wait until anything is queued. Returns `false` on shutdown with nothing left.
    fn wait_until_nonempty(&self, state: &mut MutexGuard<'_, State<A, R>>) -> bool {
        while state.events.is_empty() {
            if !self.is_open() {
                return false;
            }
            self.available.wait(state);
        }
        true
    }

    /// Block until the earliest event is due and take it.
    ///
    /// Returns `None` once the queue is shut down, even if events remain.
    pub fn wait_pop(&self) -> Option<Event<A, R>> {
        let mut state = self.state.lock();
        if !self.wait_until_due(&mut state) {
            return None;
        }
        let event = state.events.pop();
        trace!(queue = %self.name, remaining = state.events.len(), "event popped");
        event
    }

    /// Block until at least one event is due and take every due event.
    ///
    /// Events not yet due stay queued. Returns `None` once shut down.
    pub fn wait_pop_all(&self) -> Option<EventContainer<Event<A, R>>> {
        let mut state = self.state.lock();
        if !self.wait_until_due(&mut state) {
            return None;
        }
        let due = state.events.pop_due(Instant::now());
        trace!(queue = %self.name, popped = due.len(), remaining = state.events.len(), "due events popped");
        Some(due)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Stop delivering events and wake every waiting consumer. Idempotent.
    pub fn shutdown(&self) {
        let state = self.state.lock();
        let was_open = !self.shutdown.swap(true, Ordering::AcqRel);
        drop(state);
        self.available.notify_all();
        if was_open {
            debug!(queue = %self.name, "timer queue shut down");
        }
    }

    /// Reopen a shut-down queue. Pending events and handles are untouched.
    pub fn restart(&self) {
        let _state = self.state.lock();
        if self.shutdown.swap(false, Ordering::AcqRel) {
            debug!(queue = %self.name, "timer queue restarted");
        }
    }

    /// Discard every pending event.
    ///
    /// Discarded events are dropped after the lock is released, so bridged
    /// callers waiting on them wake with a failure result.
    pub fn clear(&self) {
        let discarded = self.state.lock().events.take_all();
        debug!(queue = %self.name, discarded = discarded.len(), "timer queue cleared");
        drop(discarded);
    }

    /// Shut down, block until every [`QueueHandle`] has been released, then
    /// discard the events still pending.
    ///
    /// Discarded events are dropped after the lock is released, so bridged
    /// callers still waiting on them wake with a failure result.
    pub fn shutdown_and_wait(&self) {
        self.shutdown();
        let mut state = self.state.lock();
        while state.consumers > 0 {
            debug!(queue = %self.name, consumers = state.consumers, "waiting for consumers to release");
            self.released.wait(&mut state);
        }
        let discarded = state.events.take_all();
        drop(state);
        if !discarded.is_empty() {
            debug!(queue = %self.name, discarded = discarded.len(), "pending events discarded");
        }
        drop(discarded);
    }

    pub(crate) fn acquire_consumer(&self) {
        let mut state = self.state.lock();
        state.consumers += 1;
        debug!(queue = %self.name, consumers = state.consumers, "consumer registered");
    }

    pub(crate) fn release_consumer(&self) {
        let mut state = self.state.lock();
        state.consumers = state.consumers.saturating_sub(1);
        debug!(queue = %self.name, consumers = state.consumers, "consumer released");
        drop(state);
        self.released.notify_all();
    }

    // ------------------------------------------------------------------
    // Call-bridge
    // ------------------------------------------------------------------

    /// Run `f` on the next consumer and wait for its result.
    ///
    /// The call is queued as urgent. Returns `None` if `f` panicked, or if the
    /// queue rejected or discarded the call before a consumer ran it; the
    /// panic itself surfaces on the consumer. A unit-returning `f` yields
    /// `Some(())` as its success flag. The consumer receives `R::default()`
    /// as the event's return value.
    ///
    /// Calling this from the only consumer thread deadlocks: nobody is left to
    /// run the event.
    pub fn synchronize<F, T>(&self, f: F) -> Option<T>
    where
        A: 'static,
        R: Default + Send + 'static,
        F: FnOnce(A) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.synchronize_returning(f, R::default())
    }

    /// Like [`synchronize`](Self::synchronize), handing `loop_value` back to the
    /// consumer as the event's return value.
    pub fn synchronize_returning<F, T>(&self, f: F, loop_value: R) -> Option<T>
    where
        A: 'static,
        R: Send + 'static,
        F: FnOnce(A) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (promise, pending) = bridge::promise();
        if !self.schedule_urgent(bridged(promise, f, loop_value)) {
            return None;
        }
        pending.wait()
    }

    /// Async form of [`synchronize`](Self::synchronize) for producers running
    /// on a tokio runtime.
    #[cfg(feature = "tokio-runtime")]
    pub async fn synchronize_async<F, T>(&self, f: F) -> Option<T>
    where
        A: 'static,
        R: Default + Send + 'static,
        F: FnOnce(A) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if !self.schedule_urgent(bridged(Promise::new(tx), f, R::default())) {
            return None;
        }
        rx.await.ok().flatten()
    }
}

/// Wrap `f` so its result fulfils `promise`.
///
/// If `f` panics, unwinding drops the promise unfulfilled and the waiter
/// receives `None`.
fn bridged<A, R, F, T, S>(promise: Promise<T, S>, f: F, loop_value: R) -> impl FnOnce(A) -> R + Send + 'static
where
    A: 'static,
    R: Send + 'static,
    F: FnOnce(A) -> T + Send + 'static,
    T: 'static,
    S: Settle<T> + 'static,
{
    move |args| {
        promise.fulfil(f(args));
        loop_value
    }
}

impl<A, R> Drop for TimerQueue<A, R> {
    fn drop(&mut self) {
        self.shutdown_and_wait();
    }
}

/// Retrieval that ignores deadlines.
///
/// These break the queue's timing guarantees and exist for deterministic
/// tests that only care about order. Bring the trait into scope explicitly to
/// use them.
pub trait DeadlineBypass {
    /// Event type handed out.
    type Event;

    /// Block until anything is queued and take the earliest event, due or not.
    ///
    /// Returns `None` once the queue is shut down and empty.
    fn wait_pop_any(&self) -> Option<Self::Event>;

    /// Block until anything is queued and take every event.
    ///
    /// Returns `None` once the queue is shut down and empty.
    fn wait_pop_all_any(&self) -> Option<EventContainer<Self::Event>>;
}

impl<A, R> DeadlineBypass for TimerQueue<A, R> {
    type Event = Event<A, R>;

    fn wait_pop_any(&self) -> Option<Event<A, R>> {
        let mut state = self.state.lock();
        if !self.wait_until_nonempty(&mut state) {
            return None;
        }
        state.events.pop()
    }

    fn wait_pop_all_any(&self) -> Option<EventContainer<Event<A, R>>> {
        let mut state = self.state.lock();
        if !self.wait_until_nonempty(&mut state) {
            return None;
        }
        Some(state.events.take_all())
    }
}
