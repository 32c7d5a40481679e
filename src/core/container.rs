//! Min-deadline event container.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use super::Deadline;

/// An event paired with its deadline.
///
/// `seq` is stamped by the owning container at insertion and breaks ties
/// between equal deadlines in insertion order.
#[derive(Debug)]
pub struct TimedItem<E> {
    deadline: Deadline,
    seq: u64,
    event: E,
}

impl<E> TimedItem<E> {
    /// Deadline the item was queued with.
    pub const fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Consume the item, returning its event.
    pub fn into_event(self) -> E {
        self.event
    }
}

impl<E> PartialEq for TimedItem<E> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<E> Eq for TimedItem<E> {}

impl<E> PartialOrd for TimedItem<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for TimedItem<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and the earliest deadline must win.
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

/// Events ordered by deadline, earliest first.
///
/// Returned by [`TimerQueue::wait_pop_all`](crate::TimerQueue::wait_pop_all);
/// iterating it yields the events in delivery order.
///
/// ```
/// use prometheus_timer_queue::{Deadline, EventContainer};
/// use std::time::{Duration, Instant};
///
/// let now = Instant::now();
/// let mut events = EventContainer::new();
/// events.push(Deadline::Scheduled(now + Duration::from_secs(1)), "later");
/// events.push(Deadline::Immediate(0), "first");
/// events.push(Deadline::Scheduled(now), "now");
///
/// let order: Vec<_> = events.into_iter().collect();
/// assert_eq!(order, ["first", "now", "later"]);
/// ```
#[derive(Debug)]
pub struct EventContainer<E> {
    heap: BinaryHeap<TimedItem<E>>,
    next_seq: u64,
}

impl<E> Default for EventContainer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventContainer<E> {
    /// Create an empty container.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Create an empty container with room for `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the container holds no events.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Reserve room for at least `additional` more events.
    pub fn reserve(&mut self, additional: usize) {
        self.heap.reserve(additional);
    }

    /// Queue `event` at `deadline`. O(log n).
    pub fn push(&mut self, deadline: Deadline, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(TimedItem {
            deadline,
            seq,
            event,
        });
    }

    /// Deadline of the earliest event.
    pub fn peek_deadline(&self) -> Option<Deadline> {
        self.heap.peek().map(|item| item.deadline)
    }

    /// Remove the earliest event.
    pub fn pop(&mut self) -> Option<E> {
        self.pop_item().map(TimedItem::into_event)
    }

    /// Remove the earliest event together with its deadline.
    pub fn pop_item(&mut self) -> Option<TimedItem<E>> {
        self.heap.pop()
    }

    /// Move every event due at `now` into a new container, leaving the rest.
    ///
    /// Relative order of the moved events is preserved.
    pub fn pop_due(&mut self, now: Instant) -> Self {
        let mut due = Self {
            heap: BinaryHeap::new(),
            next_seq: self.next_seq,
        };
        while self.heap.peek().is_some_and(|item| item.deadline.is_due(now)) {
            if let Some(item) = self.heap.pop() {
                due.heap.push(item);
            }
        }
        due
    }

    /// Take every event, leaving the container empty.
    ///
    /// Insertion stamps keep counting from where they were, so events pushed
    /// afterwards still order after equal-deadline events taken here.
    pub fn take_all(&mut self) -> Self {
        let heap = std::mem::take(&mut self.heap);
        Self {
            heap,
            next_seq: self.next_seq,
        }
    }

    /// Drop every queued event.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<E> Extend<(Deadline, E)> for EventContainer<E> {
    fn extend<I: IntoIterator<Item = (Deadline, E)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (deadline, event) in iter {
            self.push(deadline, event);
        }
    }
}

/// Owning iterator yielding events earliest deadline first.
#[derive(Debug)]
pub struct IntoIter<E> {
    events: EventContainer<E>,
}

impl<E> Iterator for IntoIter<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.events.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.events.len();
        (len, Some(len))
    }
}

impl<E> ExactSizeIterator for IntoIter<E> {}

impl<E> IntoIterator for EventContainer<E> {
    type Item = E;
    type IntoIter = IntoIter<E>;

    fn into_iter(self) -> IntoIter<E> {
        IntoIter { events: self }
    }
}
