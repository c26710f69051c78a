//! Delayed-task scheduling and the debouncer built on it.
//!
//! `Scheduler` is injected so tests can swap the tokio timer for
//! `ManualScheduler` and step a fake clock by hand.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay` unless the returned handle is cancelled first.
    fn schedule(&self, delay: Duration, task: Task) -> ScheduleHandle;
}

/// Cancels a scheduled task. Dropping the handle does not cancel.
pub struct ScheduleHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ScheduleHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self { Self { cancel: Some(Box::new(cancel)) } }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() { cancel(); }
    }
}

/// Production scheduler: one sleeping tokio task per scheduled call.
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduleHandle {
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        ScheduleHandle::new(move || join.abort())
    }
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), Task>,
}

/// Fake clock. Nothing runs until `advance` moves time past a deadline;
/// due tasks run in deadline order on the caller's thread.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, ManualInner> { self.inner.lock().unwrap_or_else(PoisonError::into_inner) }

    pub fn now(&self) -> Duration { self.lock().now }

    pub fn pending(&self) -> usize { self.lock().pending.len() }

    /// Move the clock forward by `by`, running every task that falls due.
    /// Tasks may schedule further tasks; those run too if they fall due.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;
        loop {
            let due = {
                let mut inner = self.lock();
                let next = inner.pending.keys().next().copied();
                match next {
                    Some(slot) if slot.0 <= target => {
                        inner.now = slot.0;
                        inner.pending.remove(&slot)
                    }
                    _ => None,
                }
            };
            match due {
                Some(task) => task(),
                None => break,
            }
        }
        self.lock().now = target;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduleHandle {
        let slot = {
            let mut inner = self.lock();
            let slot = (inner.now + delay, inner.next_id);
            inner.next_id += 1;
            inner.pending.insert(slot, task);
            slot
        };
        let inner = self.inner.clone();
        ScheduleHandle::new(move || {
            inner.lock().unwrap_or_else(PoisonError::into_inner).pending.remove(&slot);
        })
    }
}

/// Emits only the last value pushed within a quiet period of `delay`.
pub struct Debouncer<T> {
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
    sink: Arc<dyn Fn(T) + Send + Sync>,
    pending: Option<ScheduleHandle>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(scheduler: Arc<dyn Scheduler>, delay: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self { scheduler, delay, sink: Arc::new(sink), pending: None }
    }

    pub fn delay(&self) -> Duration { self.delay }

    /// Restart the quiet period with `value` as the candidate.
    pub fn update(&mut self, value: T) {
        self.cancel();
        let sink = self.sink.clone();
        self.pending = Some(self.scheduler.schedule(self.delay, Box::new(move || sink(value))));
    }

    /// Emit `value` now and drop anything pending.
    pub fn flush(&mut self, value: T) {
        self.cancel();
        (self.sink)(value);
    }

    /// Tear down the pending timer without emitting. Returns whether one existed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => { handle.cancel(); true }
            None => false,
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() { handle.cancel(); }
    }
}
