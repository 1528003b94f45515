//! The two-ended channel abstraction.
//!
//! A channel pairs an independent **sink** (accepts values, completion and
//! errors) with an independent **source** (pushes events to subscribers).
//! [`Subject`] is the concrete hot multicast channel; [`Relay`] glues an
//! arbitrary sink and source into one logical channel, the way the
//! original transformer-subject pattern does.
//!
//! # Invariants
//!
//! 1. Every value sent into a [`Subject`] is delivered to every subscriber
//!    that was registered before the send, in registration order.
//! 2. Subscribers never see events that predate their subscription; a
//!    `Subject` does not replay values.
//! 3. A terminal event ([`Event::Failed`] or [`Event::Closed`]) is
//!    latched: later sends are ignored and late subscribers receive the
//!    terminal event immediately.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle; a drop during an in-flight notification lets
//!    that notification complete.
//! 5. All delivery is synchronous and re-entrant on the calling thread;
//!    events are never buffered, coalesced, or reordered.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{ConvertError, LensError};

/// One notification on a channel.
#[derive(Debug, Clone)]
pub enum Event<T> {
    /// A new value.
    Next(T),
    /// The channel failed; no further values will follow.
    Failed(ChannelError),
    /// The channel completed normally; no further values will follow.
    Closed,
}

impl<T> Event<T> {
    /// Whether this event ends the channel.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Next(_))
    }
}

/// A cloneable, type-erased channel failure.
#[derive(Debug, Clone)]
pub struct ChannelError {
    message: Rc<str>,
}

impl ChannelError {
    /// Wrap a message as a channel error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ChannelError {}

impl From<LensError> for ChannelError {
    fn from(e: LensError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConvertError> for ChannelError {
    fn from(e: ConvertError) -> Self {
        Self::new(e.to_string())
    }
}

/// A subscriber callback.
pub type Handler<T> = Box<dyn FnMut(Event<T>)>;

/// The write end of a channel.
pub trait ChannelSink<T> {
    /// Push one event into the channel.
    fn send(&self, event: Event<T>);

    /// Push a value.
    fn push(&self, value: T) {
        self.send(Event::Next(value));
    }

    /// Complete the channel.
    fn close(&self) {
        self.send(Event::Closed);
    }

    /// Fail the channel.
    fn fail(&self, error: ChannelError) {
        self.send(Event::Failed(error));
    }
}

/// The read end of a channel.
pub trait ChannelSource<T> {
    /// Register a callback for current-and-future events.
    ///
    /// The callback fires until the returned [`Subscription`] is dropped
    /// or the channel terminates.
    #[must_use]
    fn watch(&self, handler: Handler<T>) -> Subscription;
}

/// A full two-ended channel: values pushed into the sink are observable
/// via the source, and terminal events propagate to subscribers.
pub trait Channel<T>: ChannelSink<T> + ChannelSource<T> {}

impl<T, C: ChannelSink<T> + ChannelSource<T>> Channel<T> for C {}

/// RAII subscription guard; unsubscribes on drop. Idempotent.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription that runs `cancel` once, on drop or explicit
    /// [`Subscription::unsubscribe`].
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release.
    #[must_use]
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Release the subscription now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type SharedHandler<T> = Rc<RefCell<Handler<T>>>;

struct SubjectInner<T> {
    next_id: u64,
    subscribers: Vec<(u64, SharedHandler<T>)>,
    terminal: Option<Event<T>>,
}

/// A hot multicast channel.
///
/// Cloning shares the underlying subscriber list; all clones are the same
/// logical channel.
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                next_id: 0,
                subscribers: Vec::new(),
                terminal: None,
            })),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> ChannelSink<T> for Subject<T> {
    fn send(&self, event: Event<T>) {
        // Latch the first terminal event; everything after it is ignored.
        let snapshot: Vec<SharedHandler<T>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.terminal.is_some() {
                return;
            }
            if event.is_terminal() {
                inner.terminal = Some(event.clone());
            }
            inner
                .subscribers
                .iter()
                .map(|(_, h)| Rc::clone(h))
                .collect()
        };
        // Deliver outside the borrow so handlers may re-enter the subject.
        // Subscribers added during delivery do not see the in-flight event.
        for handler in snapshot {
            (handler.borrow_mut())(event.clone());
        }
        if event.is_terminal() {
            self.inner.borrow_mut().subscribers.clear();
        }
    }
}

impl<T: Clone + 'static> ChannelSource<T> for Subject<T> {
    fn watch(&self, mut handler: Handler<T>) -> Subscription {
        {
            let inner = self.inner.borrow();
            if let Some(terminal) = &inner.terminal {
                let terminal = terminal.clone();
                drop(inner);
                handler(terminal);
                return Subscription::empty();
            }
        }
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Rc::new(RefCell::new(handler))));
            id
        };
        let weak: Weak<RefCell<SubjectInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|(sid, _)| *sid != id);
            }
        })
    }
}

/// An independent sink and source paired into one logical channel.
///
/// Optionally owns subscriptions whose lifetime must match the channel's
/// (forwarding plumbing created by the transformation engine).
pub struct Relay<T> {
    sink: Rc<dyn ChannelSink<T>>,
    source: Rc<dyn ChannelSource<T>>,
    _guards: Vec<Subscription>,
}

impl<T> Relay<T> {
    /// Pair `sink` and `source`.
    pub fn new(sink: Rc<dyn ChannelSink<T>>, source: Rc<dyn ChannelSource<T>>) -> Self {
        Self {
            sink,
            source,
            _guards: Vec::new(),
        }
    }

    /// Pair `sink` and `source`, keeping `guards` alive as long as the
    /// relay.
    pub fn with_guards(
        sink: Rc<dyn ChannelSink<T>>,
        source: Rc<dyn ChannelSource<T>>,
        guards: Vec<Subscription>,
    ) -> Self {
        Self {
            sink,
            source,
            _guards: guards,
        }
    }
}

impl<T> ChannelSink<T> for Relay<T> {
    fn send(&self, event: Event<T>) {
        self.sink.send(event);
    }
}

impl<T> ChannelSource<T> for Relay<T> {
    fn watch(&self, handler: Handler<T>) -> Subscription {
        self.source.watch(handler)
    }
}

/// A sink built from a plain function, for out-of-band notification
/// endpoints.
pub fn sink_from_fn<T: 'static, F: Fn(Event<T>) + 'static>(f: F) -> Rc<dyn ChannelSink<T>> {
    struct FnSink<T, F: Fn(Event<T>)> {
        f: F,
        _marker: std::marker::PhantomData<T>,
    }
    impl<T, F: Fn(Event<T>)> ChannelSink<T> for FnSink<T, F> {
        fn send(&self, event: Event<T>) {
            (self.f)(event);
        }
    }
    Rc::new(FnSink {
        f,
        _marker: std::marker::PhantomData,
    })
}
