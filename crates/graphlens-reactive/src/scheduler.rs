//! Injected dispatch for outward notifications.
//!
//! The original design re-dispatched converted notifications onto an
//! ambient UI thread. Here the seam is explicit: channel construction
//! takes a [`Scheduler`], and the default [`InlineScheduler`] runs
//! everything synchronously on the calling thread.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A place to run notification callbacks.
pub trait Scheduler {
    /// Run `task`, now or later. Tasks scheduled from the same thread
    /// must run in scheduling order.
    fn schedule(&self, task: Box<dyn FnOnce()>);
}

/// Runs tasks immediately on the calling thread. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn schedule(&self, task: Box<dyn FnOnce()>) {
        task();
    }
}

/// Queues tasks until [`QueueScheduler::run`] drains them.
///
/// Deterministic stand-in for a UI-thread dispatcher in tests: assert
/// nothing was delivered, then `run()` and assert delivery.
#[derive(Clone, Default)]
pub struct QueueScheduler {
    queue: Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>,
}

impl QueueScheduler {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Drain and run queued tasks in order, including tasks queued by the
    /// tasks themselves.
    pub fn run(&self) {
        loop {
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for QueueScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
