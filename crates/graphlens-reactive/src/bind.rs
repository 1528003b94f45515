//! The two-way binding protocol.
//!
//! [`two_way_bind`] wires two channels together so each side's values are
//! mirrored into the other, with a last-propagated-value cache breaking
//! feedback loops and an arming flag arbitrating initial state.
//!
//! # Invariants
//!
//! 1. Right-hand updates are ignored until the left side has propagated at
//!    least once, so a right-hand default cannot silently overwrite a
//!    not-yet-initialized left-hand value at subscription time.
//! 2. A value equal (by `PartialEq`) to the last propagated value is not
//!    re-propagated; a full feedback cycle therefore terminates after at
//!    most one round trip.
//! 3. A failing right-side validation suppresses propagation silently; it
//!    raises nothing and does not block future updates.
//! 4. After a left-to-right transfer the validator runs advisorily; its
//!    result does not gate the transfer.
//! 5. Terminal events on either side forward to the opposite sink.
//! 6. Dropping the [`BindingGuard`] releases both subscriptions;
//!    disposal is idempotent and order-independent, and a drop during an
//!    in-flight push lets that push complete.
//!
//! The cache and arming flag are private to one binding link; no two
//! links share state. Validators must be side-effect-free with respect to
//! the channels they gate.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::channel::{Channel, Event, Subscription};

/// Holds a two-way binding's subscriptions; drop to disconnect.
#[derive(Debug)]
pub struct BindingGuard {
    _left: Subscription,
    _right: Subscription,
}

impl BindingGuard {
    /// Release the binding now.
    pub fn dispose(self) {
        drop(self);
    }
}

/// Bind `left` and `right` with no validation (always propagate).
pub fn two_way_bind<T>(left: Rc<dyn Channel<T>>, right: Rc<dyn Channel<T>>) -> BindingGuard
where
    T: Clone + PartialEq + 'static,
{
    two_way_bind_validated(left, right, |_| true)
}

/// Bind `left` and `right`, gating right-to-left propagation on
/// `validate_right`.
///
/// The left side is authoritative at subscription time: nothing flows
/// right-to-left until the left has pushed once. When a value moves left
/// to right the validator still runs, advisorily, so validation state
/// tracks the visible value.
pub fn two_way_bind_validated<T>(
    left: Rc<dyn Channel<T>>,
    right: Rc<dyn Channel<T>>,
    validate_right: impl Fn(&T) -> bool + 'static,
) -> BindingGuard
where
    T: Clone + PartialEq + 'static,
{
    let last: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
    let armed = Rc::new(Cell::new(false));
    let validate = Rc::new(validate_right);

    // Right first: the left subscription below may replay the current
    // value immediately, and that replay must find the right side wired.
    let right_sub = {
        let left = Rc::clone(&left);
        let last = Rc::clone(&last);
        let armed = Rc::clone(&armed);
        let validate = Rc::clone(&validate);
        right.watch(Box::new(move |event| match event {
            Event::Next(value) => {
                if !armed.get() {
                    trace!("right-hand update before left initialized, ignored");
                    return;
                }
                if last.borrow().as_ref() == Some(&value) {
                    return;
                }
                *last.borrow_mut() = Some(value.clone());
                if validate(&value) {
                    left.push(value);
                } else {
                    trace!("right-hand value failed validation, suppressed");
                }
            }
            Event::Failed(e) => left.fail(e),
            Event::Closed => left.close(),
        }))
    };

    let left_sub = {
        let right = Rc::clone(&right);
        let last = Rc::clone(&last);
        let armed = Rc::clone(&armed);
        let validate = Rc::clone(&validate);
        left.watch(Box::new(move |event| match event {
            Event::Next(value) => {
                if last.borrow().as_ref() == Some(&value) {
                    return;
                }
                *last.borrow_mut() = Some(value.clone());
                right.push(value.clone());
                // Advisory only: keeps validation state in step with the
                // transferred value, never gates the transfer.
                let _ = validate(&value);
                armed.set(true);
            }
            Event::Failed(e) => right.fail(e),
            Event::Closed => right.close(),
        }))
    };

    BindingGuard {
        _left: left_sub,
        _right: right_sub,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelSource, Subject};

    fn channel<T: Clone + 'static>() -> Rc<dyn Channel<T>> {
        Rc::new(Subject::new())
    }

    fn values<T: Clone + 'static>(
        source: &dyn ChannelSource<T>,
    ) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = source.watch(Box::new(move |e| {
            if let Event::Next(v) = e {
                sink.borrow_mut().push(v);
            }
        }));
        (seen, sub)
    }

    #[test]
    fn left_propagates_to_right_exactly_once() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen, _sub) = values(&*right);
        let _bind = two_way_bind(Rc::clone(&left), Rc::clone(&right));

        left.push(5);
        assert_eq!(seen.borrow().as_slice(), [5]);

        // Same value again: the dedupe cache suppresses it.
        left.push(5);
        assert_eq!(seen.borrow().as_slice(), [5]);
    }

    #[test]
    fn right_is_ignored_until_left_initializes() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen_left, _sub) = values(&*left);
        let _bind = two_way_bind(Rc::clone(&left), Rc::clone(&right));

        right.push(9);
        assert!(
            seen_left.borrow().is_empty(),
            "right must not override an uninitialized left"
        );

        left.push(1);
        right.push(9);
        assert_eq!(seen_left.borrow().as_slice(), [1, 9]);
    }

    #[test]
    fn round_trip_terminates() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen_left, _sl) = values(&*left);
        let (seen_right, _sr) = values(&*right);
        let _bind = two_way_bind(Rc::clone(&left), Rc::clone(&right));

        left.push(3);
        assert_eq!(seen_left.borrow().as_slice(), [3]);
        assert_eq!(seen_right.borrow().as_slice(), [3]);
    }

    #[test]
    fn validation_gates_right_to_left() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen_left, _sub) = values(&*left);
        let _bind =
            two_way_bind_validated(Rc::clone(&left), Rc::clone(&right), |v: &i32| *v > 0);

        left.push(1);
        right.push(-1);
        assert_eq!(
            seen_left.borrow().as_slice(),
            [1],
            "failing validation must suppress propagation"
        );

        right.push(5);
        assert_eq!(seen_left.borrow().as_slice(), [1, 5]);
    }

    #[test]
    fn failed_validation_does_not_block_later_updates() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen_left, _sub) = values(&*left);
        let _bind =
            two_way_bind_validated(Rc::clone(&left), Rc::clone(&right), |v: &i32| *v > 0);

        left.push(1);
        right.push(-2);
        right.push(7);
        assert_eq!(seen_left.borrow().as_slice(), [1, 7]);
    }

    #[test]
    fn validator_runs_advisorily_on_left_transfers() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&calls);

        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen_right, _sub) = values(&*right);
        let _bind = two_way_bind_validated(Rc::clone(&left), Rc::clone(&right), move |v| {
            log.borrow_mut().push(*v);
            *v > 0
        });

        // A left-side value that fails validation still transfers.
        left.push(-5);
        assert_eq!(seen_right.borrow().as_slice(), [-5]);
        assert_eq!(calls.borrow().as_slice(), [-5]);
    }

    #[test]
    fn drop_disconnects_both_directions() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let (seen_right, _sub) = values(&*right);

        {
            let bind = two_way_bind(Rc::clone(&left), Rc::clone(&right));
            left.push(1);
            bind.dispose();
        }
        left.push(2);
        assert_eq!(seen_right.borrow().as_slice(), [1]);
    }

    #[test]
    fn terminal_events_cross_the_link() {
        let left = channel::<i32>();
        let right = channel::<i32>();
        let closed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&closed);
        let _watch = right.watch(Box::new(move |e| {
            if matches!(e, Event::Closed) {
                flag.set(true);
            }
        }));
        let _bind = two_way_bind(Rc::clone(&left), Rc::clone(&right));

        left.close();
        assert!(closed.get());
    }

    #[test]
    fn any_alternating_push_sequence_converges() {
        use proptest::prelude::*;

        proptest!(|(pushes in proptest::collection::vec(any::<i32>(), 1..20))| {
            let left = channel::<i32>();
            let right = channel::<i32>();

            let left_state = Rc::new(Cell::new(0));
            let right_state = Rc::new(Cell::new(0));
            let ls = Rc::clone(&left_state);
            let rs = Rc::clone(&right_state);
            let _wl = left.watch(Box::new(move |e| {
                if let Event::Next(v) = e {
                    ls.set(v);
                }
            }));
            let _wr = right.watch(Box::new(move |e| {
                if let Event::Next(v) = e {
                    rs.set(v);
                }
            }));

            let _bind = two_way_bind(Rc::clone(&left), Rc::clone(&right));
            left.push(0);

            for (i, v) in pushes.iter().enumerate() {
                if i % 2 == 0 {
                    left.push(*v);
                } else {
                    right.push(*v);
                }
                prop_assert_eq!(left_state.get(), right_state.get());
            }
        });
    }

    #[test]
    fn links_do_not_share_state() {
        let a = channel::<i32>();
        let b = channel::<i32>();
        let c = channel::<i32>();
        let d = channel::<i32>();
        let _ab = two_way_bind(Rc::clone(&a), Rc::clone(&b));
        let _cd = two_way_bind(Rc::clone(&c), Rc::clone(&d));

        let (seen_d, _sub) = values(&*d);
        a.push(1);
        assert!(seen_d.borrow().is_empty());
        c.push(2);
        assert_eq!(seen_d.borrow().as_slice(), [2]);
    }
}
