//! Tests for the deadline-ordered container

use prometheus_timer_queue::{Deadline, EventContainer};
use std::time::{Duration, Instant};

#[test]
fn test_immediate_sorts_before_scheduled() {
    let now = Instant::now();
    assert!(Deadline::Immediate(u64::MAX) < Deadline::Scheduled(now));
    assert!(Deadline::Immediate(0) < Deadline::Immediate(1));
    assert!(Deadline::Scheduled(now) < Deadline::Scheduled(now + Duration::from_nanos(1)));
}

#[test]
fn test_pop_due_splits_at_now() {
    let now = Instant::now();
    let mut container = EventContainer::new();
    container.push(Deadline::Scheduled(now + Duration::from_secs(1)), "later");
    container.push(Deadline::Scheduled(now), "now");
    container.push(Deadline::Immediate(0), "urgent");

    let due: Vec<_> = container.pop_due(now).into_iter().collect();
    assert_eq!(due, vec!["urgent", "now"]);
    assert_eq!(container.len(), 1);
    assert_eq!(
        container.peek_deadline(),
        Some(Deadline::Scheduled(now + Duration::from_secs(1)))
    );
}

#[test]
fn test_extend_then_drain_in_order() {
    let now = Instant::now();
    let mut container = EventContainer::with_capacity(4);
    container.extend([
        (Deadline::Scheduled(now + Duration::from_millis(3)), 3),
        (Deadline::Scheduled(now + Duration::from_millis(1)), 1),
        (Deadline::Scheduled(now + Duration::from_millis(1)), 2),
        (Deadline::Immediate(7), 0),
    ]);

    let drained = container.take_all();
    assert!(container.is_empty());
    assert_eq!(drained.len(), 4);
    assert_eq!(drained.into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}
