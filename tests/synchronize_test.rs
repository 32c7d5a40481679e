//! Integration tests for the synchronous call-bridge
//!
//! These tests validate that producers blocked in `synchronize`:
//! - Receive the callable's result from a consumer thread
//! - Receive `None` when the callable panics
//! - Receive `None` when the queue rejects or discards the call, including
//!   calls still pending when `shutdown_and_wait` returns
//! - Never hang under many concurrent callers

use prometheus_timer_queue::util::init_test_tracing;
use prometheus_timer_queue::{run_consumer, DispatchStats, QueueHandle, TimerQueue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn start_consumer<R: 'static>(queue: &Arc<TimerQueue<(), R>>) -> JoinHandle<DispatchStats> {
    let handle = QueueHandle::shared(Arc::clone(queue));
    thread::spawn(move || run_consumer(handle, || ()))
}

// ============================================================================
// RESULTS
// ============================================================================

#[test]
fn test_synchronize_returns_value() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumer = start_consumer(&queue);

    assert_eq!(queue.synchronize(|()| 42), Some(42));
    assert_eq!(
        queue.synchronize(|()| String::from("from consumer")),
        Some(String::from("from consumer"))
    );

    queue.shutdown_and_wait();
    assert_eq!(consumer.join().unwrap().executed, 2);
}

#[test]
fn test_synchronize_runs_on_consumer_thread() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumer = start_consumer(&queue);
    let consumer_id = consumer.thread().id();

    assert_eq!(queue.synchronize(|()| thread::current().id()), Some(consumer_id));

    queue.shutdown_and_wait();
    consumer.join().unwrap();
}

#[test]
fn test_synchronize_unit_reports_success() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumer = start_consumer(&queue);

    assert_eq!(queue.synchronize(|()| ()), Some(()));

    queue.shutdown_and_wait();
    consumer.join().unwrap();
}

#[test]
fn test_synchronize_returning_hands_value_to_consumer() {
    let queue: TimerQueue<u32, u32> = TimerQueue::new();

    let returned = thread::scope(|s| {
        let handle = queue.handle();
        let consumer = s.spawn(move || handle.wait_pop().map(|event| event(3)));
        assert_eq!(queue.synchronize_returning(|n| n * 2, 99), Some(6));
        consumer.join().unwrap()
    });
    assert_eq!(returned, Some(99));
}

#[test]
fn test_synchronize_jumps_ahead_of_scheduled_events() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for i in 0..3 {
        let order = Arc::clone(&order);
        assert!(queue.schedule_in(Duration::from_millis(500), move |()| order.lock().push(i)));
    }

    let consumer = start_consumer(&queue);
    let marker = Arc::clone(&order);
    assert_eq!(queue.synchronize(move |()| marker.lock().push(100)), Some(()));
    assert_eq!(*order.lock(), vec![100]);

    queue.shutdown_and_wait();
    consumer.join().unwrap();
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_synchronize_panic_returns_none() {
    init_test_tracing();
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumer = start_consumer(&queue);

    let fail = true;
    let result: Option<u32> = queue.synchronize(move |()| {
        assert!(!fail, "callable failed on purpose");
        1
    });
    assert_eq!(result, None);

    // The consumer survives and keeps serving calls.
    assert_eq!(queue.synchronize(|()| 7), Some(7));

    queue.shutdown_and_wait();
    let stats = consumer.join().unwrap();
    assert_eq!(stats.panicked, 1);
    assert_eq!(stats.executed, 1);
}

#[test]
fn test_synchronize_after_shutdown_returns_none() {
    let queue: TimerQueue = TimerQueue::new();
    queue.shutdown();
    assert_eq!(queue.synchronize(|()| 1), None);
    assert!(queue.is_empty());
}

#[test]
fn test_synchronize_discarded_by_clear_returns_none() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());

    let caller = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.synchronize(|()| 5))
    };

    while queue.is_empty() {
        thread::sleep(Duration::from_millis(1));
    }
    queue.clear();

    assert_eq!(caller.join().unwrap(), None);
}

#[test]
fn test_synchronize_pending_at_shutdown_and_wait_returns_none() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumer = start_consumer(&queue);

    let (busy_tx, busy_rx) = crossbeam_channel::bounded(1);
    assert!(queue.schedule_urgent(move |()| {
        let _ = busy_tx.send(());
        thread::sleep(Duration::from_millis(100));
    }));
    busy_rx.recv().unwrap();

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let caller = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let _ = done_tx.send(queue.synchronize(|()| 42));
        })
    };
    while queue.is_empty() {
        thread::sleep(Duration::from_millis(1));
    }

    queue.shutdown_and_wait();
    consumer.join().unwrap();

    let result = done_rx.recv_timeout(Duration::from_secs(5));
    assert_eq!(result, Ok(None), "caller must wake once shutdown_and_wait discards its call");
    caller.join().unwrap();
    assert!(queue.is_empty());
}

// ============================================================================
// STRESS
// ============================================================================

#[test]
fn test_many_concurrent_callers() {
    const CALLERS: u64 = 8;
    const CALLS: u64 = 200;

    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumers: Vec<_> = (0..3).map(|_| start_consumer(&queue)).collect();
    let total = Arc::new(AtomicU64::new(0));

    let callers: Vec<_> = (0..CALLERS)
        .map(|c| {
            let queue = Arc::clone(&queue);
            let total = Arc::clone(&total);
            thread::spawn(move || {
                for i in 0..CALLS {
                    let got = queue.synchronize(move |()| c * CALLS + i);
                    assert_eq!(got, Some(c * CALLS + i));
                    total.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }
    assert_eq!(total.load(Ordering::SeqCst), CALLERS * CALLS);

    queue.shutdown_and_wait();
    let executed: u64 = consumers
        .into_iter()
        .map(|consumer| consumer.join().unwrap().executed)
        .sum();
    assert_eq!(executed, CALLERS * CALLS);
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test]
async fn test_synchronize_async_returns_value() {
    let queue: Arc<TimerQueue> = Arc::new(TimerQueue::new());
    let consumer = start_consumer(&queue);

    assert_eq!(queue.synchronize_async(|()| 21 * 2).await, Some(42));

    queue.shutdown_and_wait();
    consumer.join().unwrap();
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test]
async fn test_synchronize_async_after_shutdown_returns_none() {
    let queue: TimerQueue = TimerQueue::new();
    queue.shutdown();
    assert_eq!(queue.synchronize_async(|()| 1).await, None);
}
