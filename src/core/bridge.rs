//! Complete-or-cancel promise backing the synchronous call-bridge.
//!
//! A [`Promise`] travels inside the event submitted by `synchronize`. It either
//! gets fulfilled with the callable's result, or it is dropped: when the event
//! unwinds from a panic, when the queue rejects it, or when the queue discards
//! it unexecuted. Dropping an unfulfilled promise sends `None`, so the waiting
//! producer always wakes.

use std::marker::PhantomData;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Destination for the single outcome of a promise.
pub(crate) trait Settle<T>: Send {
    /// Deliver the outcome. Receivers that have gone away are ignored.
    fn settle(self, outcome: Option<T>);
}

impl<T: Send> Settle<T> for Sender<Option<T>> {
    fn settle(self, outcome: Option<T>) {
        let _ = self.send(outcome);
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T: Send> Settle<T> for tokio::sync::oneshot::Sender<Option<T>> {
    fn settle(self, outcome: Option<T>) {
        let _ = self.send(outcome);
    }
}

/// Sending half of the bridge.
pub(crate) struct Promise<T, S: Settle<T>> {
    sink: Option<S>,
    _value: PhantomData<fn(T)>,
}

impl<T, S: Settle<T>> Promise<T, S> {
    pub(crate) const fn new(sink: S) -> Self {
        Self {
            sink: Some(sink),
            _value: PhantomData,
        }
    }

    /// Record the real result, disarming the failure sentinel.
    pub(crate) fn fulfil(mut self, value: T) {
        if let Some(sink) = self.sink.take() {
            sink.settle(Some(value));
        }
    }
}

impl<T, S: Settle<T>> Drop for Promise<T, S> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.settle(None);
        }
    }
}

/// Receiving half for blocking callers.
pub(crate) struct Pending<T> {
    rx: Receiver<Option<T>>,
}

impl<T> Pending<T> {
    /// Block until the promise is fulfilled or abandoned.
    pub(crate) fn wait(self) -> Option<T> {
        self.rx.recv().ok().flatten()
    }
}

/// Create a blocking promise pair.
pub(crate) fn promise<T: Send>() -> (Promise<T, Sender<Option<T>>>, Pending<T>) {
    let (tx, rx) = bounded(1);
    (Promise::new(tx), Pending { rx })
}
