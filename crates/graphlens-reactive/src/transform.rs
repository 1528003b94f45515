//! Channel transformation and switching.
//!
//! [`select`] lifts a channel over `S` into a channel over `T` through a
//! [`TwoWayConvert`] pair, with conversion failures redirected into an
//! explicit out-of-band [`ErrorSink`] instead of unwinding. [`switch`]
//! re-routes between whole channels over time, and [`select_dynamic`]
//! combines the two for time-varying converters.
//!
//! # Invariants
//!
//! 1. On a successful inward conversion the error sink is notified with
//!    `None` **before** the converted value reaches the inner sink, so
//!    when stages are nested (parse, then validate) the deepest stage's
//!    failure is the last write on the error sink and is the one left
//!    standing.
//! 2. A failed inward conversion reports exactly one `Some(error)` and
//!    drops the value; the inner channel's last good value is untouched.
//! 3. The outward direction is infallible and notifies `None` whenever it
//!    fires, clearing any stale error state from the other direction.
//! 4. After a switch the newest channel is authoritative immediately; the
//!    previous channel's sink is closed before the swap, and an inward
//!    push is routed to whichever channel the dispatch observes as
//!    current. Nothing is buffered across a switch.
//! 5. A successful inward conversion is observable outward: the converted
//!    value enters the shared inner channel, whose source re-emits it
//!    through `forward` to the view's subscribers.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Inward conversion error | `backward` rejects a value | Reported on error sink, value dropped |
//! | Push before first converter | `switch` has no current channel | Value dropped |
//! | Converter stream fails | Upstream error | Forwarded to subscribers |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::channel::{
    Channel, ChannelSink, ChannelSource, Event, Handler, Relay, Subject, Subscription,
};
use crate::error::ConvertError;
use crate::scheduler::{InlineScheduler, Scheduler};

/// A pair of conversion functions between an inner type `S` and an outer
/// type `T`.
///
/// `forward` (inner to outer) is total: it mirrors values the inner
/// channel already holds. `backward` (outer to inner) may fail: it faces
/// outside input.
pub struct TwoWayConvert<S, T> {
    forward: Rc<dyn Fn(&S) -> T>,
    backward: Rc<dyn Fn(&T) -> Result<S, ConvertError>>,
}

impl<S, T> Clone for TwoWayConvert<S, T> {
    fn clone(&self) -> Self {
        Self {
            forward: Rc::clone(&self.forward),
            backward: Rc::clone(&self.backward),
        }
    }
}

impl<S, T> fmt::Debug for TwoWayConvert<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoWayConvert").finish_non_exhaustive()
    }
}

impl<S: 'static, T: 'static> TwoWayConvert<S, T> {
    /// Build a converter pair from a total forward and a fallible backward
    /// function.
    pub fn new(
        forward: impl Fn(&S) -> T + 'static,
        backward: impl Fn(&T) -> Result<S, ConvertError> + 'static,
    ) -> Self {
        Self {
            forward: Rc::new(forward),
            backward: Rc::new(backward),
        }
    }

    /// Build a converter pair where both directions are total.
    pub fn infallible(
        forward: impl Fn(&S) -> T + 'static,
        backward: impl Fn(&T) -> S + 'static,
    ) -> Self {
        Self::new(forward, move |t| Ok(backward(t)))
    }

    /// Apply the inner-to-outer direction.
    #[must_use]
    pub fn forward(&self, value: &S) -> T {
        (self.forward)(value)
    }

    /// Apply the outer-to-inner direction.
    pub fn backward(&self, value: &T) -> Result<S, ConvertError> {
        (self.backward)(value)
    }

    /// Flip the pair, treating the outer side as inner.
    ///
    /// The previously fallible direction becomes the forward one, so it
    /// must in fact be total for the flipped pair to honor the forward
    /// contract.
    #[must_use]
    pub fn compose<U: 'static>(&self, outer: TwoWayConvert<T, U>) -> TwoWayConvert<S, U> {
        let fwd_inner = self.clone();
        let fwd_outer = outer.clone();
        let bwd_inner = self.clone();
        let bwd_outer = outer;
        TwoWayConvert {
            forward: Rc::new(move |s: &S| fwd_outer.forward(&fwd_inner.forward(s))),
            backward: Rc::new(move |u: &U| bwd_inner.backward(&bwd_outer.backward(u)?)),
        }
    }
}

/// The out-of-band error notification endpoint.
///
/// `None` signals "no error", clearing earlier failure state; later
/// writes override earlier ones.
pub type ErrorSink = Rc<dyn ChannelSink<Option<ConvertError>>>;

struct SelectSink<S, T> {
    inner: Rc<dyn Channel<S>>,
    convert: TwoWayConvert<S, T>,
    errors: ErrorSink,
}

impl<S: Clone + 'static, T: Clone + 'static> ChannelSink<T> for SelectSink<S, T> {
    fn send(&self, event: Event<T>) {
        match event {
            Event::Next(value) => match self.convert.backward(&value) {
                Ok(converted) => {
                    // Success must be reported before the forward so that a
                    // deeper stage's later failure is the one left standing.
                    self.errors.push(None);
                    self.inner.send(Event::Next(converted));
                }
                Err(e) => {
                    debug!(error = %e, "inward conversion rejected");
                    self.errors.push(Some(e));
                }
            },
            Event::Failed(e) => self.inner.send(Event::Failed(e)),
            // Closing a transformed view does not close the inner channel;
            // the inner channel may outlive many views of itself.
            Event::Closed => trace!("transformed channel view closed"),
        }
    }
}

struct SelectSource<S, T> {
    inner: Rc<dyn Channel<S>>,
    convert: TwoWayConvert<S, T>,
    errors: ErrorSink,
    scheduler: Rc<dyn Scheduler>,
}

impl<S: Clone + 'static, T: Clone + 'static> ChannelSource<T> for SelectSource<S, T> {
    fn watch(&self, handler: Handler<T>) -> Subscription {
        let convert = self.convert.clone();
        let errors = Rc::clone(&self.errors);
        let scheduler = Rc::clone(&self.scheduler);
        let handler = Rc::new(RefCell::new(handler));
        self.inner.watch(Box::new(move |event| {
            let mapped = match event {
                Event::Next(value) => {
                    // The outward direction is infallible; it always clears
                    // error state when it fires.
                    errors.push(None);
                    Event::Next(convert.forward(&value))
                }
                Event::Failed(e) => Event::Failed(e),
                Event::Closed => Event::Closed,
            };
            let handler = Rc::clone(&handler);
            scheduler.schedule(Box::new(move || (handler.borrow_mut())(mapped)));
        }))
    }
}

/// Transform a channel over `S` into a channel over `T` through a
/// converter pair, reporting inward failures on `errors`.
pub fn select<S, T>(
    inner: Rc<dyn Channel<S>>,
    convert: TwoWayConvert<S, T>,
    errors: ErrorSink,
) -> Rc<dyn Channel<T>>
where
    S: Clone + 'static,
    T: Clone + 'static,
{
    select_on(inner, convert, errors, Rc::new(InlineScheduler))
}

/// [`select`] with outward notifications re-dispatched through an
/// injected scheduler.
pub fn select_on<S, T>(
    inner: Rc<dyn Channel<S>>,
    convert: TwoWayConvert<S, T>,
    errors: ErrorSink,
    scheduler: Rc<dyn Scheduler>,
) -> Rc<dyn Channel<T>>
where
    S: Clone + 'static,
    T: Clone + 'static,
{
    let sink = Rc::new(SelectSink {
        inner: Rc::clone(&inner),
        convert: convert.clone(),
        errors: Rc::clone(&errors),
    });
    let source = Rc::new(SelectSource {
        inner,
        convert,
        errors,
        scheduler,
    });
    Rc::new(Relay::new(sink, source))
}

struct SwitchState<T> {
    current: Option<Rc<dyn Channel<T>>>,
    forward_sub: Option<Subscription>,
    sources_sub: Option<Subscription>,
}

struct SwitchSink<T> {
    state: Rc<RefCell<SwitchState<T>>>,
}

impl<T: Clone + 'static> ChannelSink<T> for SwitchSink<T> {
    fn send(&self, event: Event<T>) {
        // Route to whichever channel the dispatch observes as current.
        let current = self.state.borrow().current.clone();
        match (&event, current) {
            (Event::Next(_), Some(chan)) => chan.send(event),
            (Event::Next(_), None) => trace!("push before first channel, dropped"),
            (_, current) => {
                // Terminal: stop following new channels, then forward.
                let mut state = self.state.borrow_mut();
                state.sources_sub = None;
                drop(state);
                if let Some(chan) = current {
                    chan.send(event);
                }
            }
        }
    }
}

/// Flatten a channel of channels into a single channel that always speaks
/// to the newest one.
///
/// When a new channel arrives, the previous channel's sink is closed and
/// the new channel becomes authoritative for both directions. Subscribers
/// of the result see events only from the channel that was active when
/// the event fired.
pub fn switch<T>(sources: &dyn ChannelSource<Rc<dyn Channel<T>>>) -> Rc<dyn Channel<T>>
where
    T: Clone + 'static,
{
    let out: Subject<T> = Subject::new();
    let state = Rc::new(RefCell::new(SwitchState {
        current: None,
        forward_sub: None,
        sources_sub: None,
    }));

    let switch_state = Rc::clone(&state);
    let switch_out = out.clone();
    let sub = sources.watch(Box::new(move |event| match event {
        Event::Next(chan) => {
            debug!("switching active channel");
            let previous = {
                let mut st = switch_state.borrow_mut();
                st.forward_sub = None;
                st.current.take()
            };
            // Close the displaced channel before the swap becomes visible.
            if let Some(prev) = previous {
                prev.close();
            }
            let forward_out = switch_out.clone();
            let forward = chan.watch(Box::new(move |ev| forward_out.send(ev)));
            let mut st = switch_state.borrow_mut();
            st.forward_sub = Some(forward);
            st.current = Some(chan);
        }
        Event::Failed(e) => switch_out.send(Event::Failed(e)),
        // The channel-of-channels completing leaves the last channel active.
        Event::Closed => {}
    }));
    state.borrow_mut().sources_sub = Some(sub);

    let sink = Rc::new(SwitchSink {
        state: Rc::clone(&state),
    });
    Rc::new(Relay::new(sink, Rc::new(out)))
}

/// Transform a channel with a converter that changes over time.
///
/// Each converter emitted by `converters` produces a fresh [`select`]
/// channel over the same inner channel; [`switch`] keeps the newest one
/// authoritative.
pub fn select_dynamic<S, T>(
    inner: Rc<dyn Channel<S>>,
    converters: &dyn ChannelSource<TwoWayConvert<S, T>>,
    errors: ErrorSink,
) -> Rc<dyn Channel<T>>
where
    S: Clone + 'static,
    T: Clone + 'static,
{
    let channels: Subject<Rc<dyn Channel<T>>> = Subject::new();
    let feed = channels.clone();
    let sub = converters.watch(Box::new(move |event| match event {
        Event::Next(convert) => {
            feed.push(select(Rc::clone(&inner), convert, Rc::clone(&errors)));
        }
        Event::Failed(e) => feed.send(Event::Failed(e)),
        Event::Closed => feed.close(),
    }));

    let switched = switch(&channels);
    // Tie the converter subscription's lifetime to the returned channel.
    Rc::new(Relay::with_guards(
        Rc::clone(&switched) as Rc<dyn ChannelSink<T>>,
        switched as Rc<dyn ChannelSource<T>>,
        vec![sub],
    ))
}
