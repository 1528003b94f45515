//! The reactive lens chain.
//!
//! A [`LensNode`] is a readable/writable handle onto a location in a
//! possibly-deeply-nested immutable structure, with push-based change
//! notification. [`PropertyLens`] is the root terminal wrapping one
//! externally-owned mutable holder; [`FocusedLens`] derives a child
//! handle through a pure [`Lens`], and chains of them cascade writes up
//! to the root.
//!
//! # Invariants
//!
//! 1. `current()` pulls through the full parent chain on every access —
//!    no caching, always fresh, side-effect free.
//! 2. `set_current(v)` performs exactly one real mutation, at the root
//!    holder; every intermediate node is rebuilt functionally.
//! 3. **Notification order is root-first**: the root holder commits and
//!    notifies, then each focused lens notifies as the cascade unwinds,
//!    leaf last. An observer that reads `current()` from inside a
//!    callback therefore always sees the committed tree.
//! 4. `focus` is pure: no subscription or push happens until the child's
//!    `current`/`changes` is used.
//! 5. Once the external root holder is dropped, every operation fails
//!    with [`LensError::Detached`]; there is no way back.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use graphlens_core::Lens;

use crate::channel::{
    Channel, ChannelError, ChannelSink, ChannelSource, Event, Handler, Subject, Subscription,
};
use crate::error::LensError;

/// A reactive, chainable handle onto one location in a nested structure.
pub trait LensNode<P: Clone + 'static> {
    /// The value at this location, read through the parent chain.
    fn current(&self) -> Result<P, LensError>;

    /// Replace the value at this location, rebuilding every ancestor and
    /// committing at the root holder.
    fn set_current(&self, value: P) -> Result<(), LensError>;

    /// Future values of this location, pushed on every change made
    /// through this node.
    fn changes(&self) -> Rc<dyn ChannelSource<P>>;
}

/// Derive a child handle from `parent` through `lens`.
pub fn focus<R, P>(parent: Rc<dyn LensNode<R>>, lens: Lens<R, P>) -> Rc<FocusedLens<R, P>>
where
    R: Clone + 'static,
    P: Clone + 'static,
{
    Rc::new(FocusedLens {
        parent,
        lens,
        subject: Subject::new(),
    })
}

/// A lens node focused one or more hops below a parent node.
///
/// Owns its pure [`Lens`]; shares its parent.
pub struct FocusedLens<R: Clone + 'static, P: Clone + 'static> {
    parent: Rc<dyn LensNode<R>>,
    lens: Lens<R, P>,
    subject: Subject<P>,
}

impl<R: Clone + 'static, P: Clone + 'static> FocusedLens<R, P> {
    /// Focus one hop deeper.
    #[must_use]
    pub fn focus<Q: Clone + 'static>(self: &Rc<Self>, lens: Lens<P, Q>) -> Rc<FocusedLens<P, Q>> {
        focus(Rc::clone(self) as Rc<dyn LensNode<P>>, lens)
    }
}

impl<R: Clone + 'static, P: Clone + 'static> LensNode<P> for FocusedLens<R, P> {
    fn current(&self) -> Result<P, LensError> {
        Ok(self.lens.get(&self.parent.current()?))
    }

    fn set_current(&self, value: P) -> Result<(), LensError> {
        let root = self.parent.current()?;
        self.parent.set_current(self.lens.set(&root, value.clone()))?;
        // The parent has already notified its own observers; ours fire
        // after it, preserving root-first order.
        self.subject.push(value);
        Ok(())
    }

    fn changes(&self) -> Rc<dyn ChannelSource<P>> {
        Rc::new(self.subject.clone())
    }
}

/// Root terminal: a lens onto one field of an externally-owned mutable
/// holder.
///
/// The holder is referenced weakly; when the owner drops it, the whole
/// chain hanging off this terminal becomes permanently detached.
pub struct PropertyLens<O: 'static, S: Clone + 'static> {
    host: Weak<RefCell<O>>,
    field: String,
    get: Rc<dyn Fn(&O) -> S>,
    set: Rc<dyn Fn(&mut O, S)>,
    subject: Subject<S>,
}

impl<O: 'static, S: Clone + 'static> PropertyLens<O, S> {
    /// Wrap one field of `host`.
    ///
    /// `field` is the notification key and must address exactly one
    /// field: a dotted selector fails with [`LensError::MultiSegment`].
    pub fn new(
        host: &Rc<RefCell<O>>,
        field: &str,
        get: impl Fn(&O) -> S + 'static,
        set: impl Fn(&mut O, S) + 'static,
    ) -> Result<Rc<Self>, LensError> {
        if field.is_empty() || field.contains('.') {
            return Err(LensError::MultiSegment {
                field: field.to_owned(),
            });
        }
        Ok(Rc::new(Self {
            host: Rc::downgrade(host),
            field: field.to_owned(),
            get: Rc::new(get),
            set: Rc::new(set),
            subject: Subject::new(),
        }))
    }

    /// The field this terminal addresses.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Focus into the immutable value held by the field.
    #[must_use]
    pub fn focus<Q: Clone + 'static>(self: &Rc<Self>, lens: Lens<S, Q>) -> Rc<FocusedLens<S, Q>> {
        focus(Rc::clone(self) as Rc<dyn LensNode<S>>, lens)
    }
}

impl<O: 'static, S: Clone + 'static> LensNode<S> for PropertyLens<O, S> {
    fn current(&self) -> Result<S, LensError> {
        let host = self.host.upgrade().ok_or(LensError::Detached)?;
        let value = (self.get)(&host.borrow());
        Ok(value)
    }

    fn set_current(&self, value: S) -> Result<(), LensError> {
        let host = self.host.upgrade().ok_or(LensError::Detached)?;
        (self.set)(&mut host.borrow_mut(), value.clone());
        trace!(field = %self.field, "root holder updated");
        self.subject.push(value);
        Ok(())
    }

    fn changes(&self) -> Rc<dyn ChannelSource<S>> {
        Rc::new(self.subject.clone())
    }
}

/// Wrap one named field of a shared mutable holder as a [`PropertyLens`].
///
/// ```ignore
/// let doc = Rc::new(RefCell::new(Document::default()));
/// let root = property_lens!(doc, company)?;
/// ```
#[macro_export]
macro_rules! property_lens {
    ($host:expr, $field:ident) => {
        $crate::PropertyLens::new(
            &$host,
            stringify!($field),
            |host| host.$field.clone(),
            |host, value| host.$field = value,
        )
    };
}

struct LensChannel<P: Clone + 'static> {
    node: Rc<dyn LensNode<P>>,
    out: Subject<P>,
    _forward: Subscription,
}

impl<P: Clone + 'static> ChannelSink<P> for LensChannel<P> {
    fn send(&self, event: Event<P>) {
        match event {
            Event::Next(value) => {
                if let Err(e) = self.node.set_current(value) {
                    // A stale root is fatal for the chain; surface it to
                    // whoever is listening on this channel.
                    tracing::warn!(error = %e, "write through lens channel failed");
                    self.out.send(Event::Failed(ChannelError::from(e)));
                }
            }
            other => self.out.send(other),
        }
    }
}

impl<P: Clone + 'static> ChannelSource<P> for LensChannel<P> {
    fn watch(&self, mut handler: Handler<P>) -> Subscription {
        // Leaf convenience: replay the current value so a binding's left
        // side defines the initial configuration.
        if let Ok(value) = self.node.current() {
            handler(Event::Next(value));
        }
        self.out.watch(handler)
    }
}

/// Bridge a lens node into the channel world.
///
/// The sink writes through `set_current`; the source replays the current
/// value to each new subscriber and then follows changes. A write that
/// fails because the root is gone surfaces as [`Event::Failed`].
pub fn lens_channel<P: Clone + 'static>(node: Rc<dyn LensNode<P>>) -> Rc<dyn Channel<P>> {
    let out: Subject<P> = Subject::new();
    let feed = out.clone();
    let forward = node
        .changes()
        .watch(Box::new(move |event| feed.send(event)));
    Rc::new(LensChannel {
        node,
        out,
        _forward: forward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlens_core::Lens;
    use std::cell::Cell;

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        name: String,
        badge: Rc<u32>,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Company {
        name: String,
        cto: Person,
    }

    #[derive(Debug)]
    struct Document {
        company: Company,
    }

    fn document() -> Rc<RefCell<Document>> {
        Rc::new(RefCell::new(Document {
            company: Company {
                name: "Microsoft".to_owned(),
                cto: Person {
                    name: "john smith".to_owned(),
                    badge: Rc::new(7),
                },
            },
        }))
    }

    fn cto_lens() -> Lens<Company, Person> {
        graphlens_core::field_lens!(Company, cto)
    }

    fn person_name_lens() -> Lens<Person, String> {
        graphlens_core::field_lens!(Person, name)
    }

    #[test]
    fn current_reads_through_the_chain() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());
        assert_eq!(name.current().unwrap(), "john smith");
    }

    #[test]
    fn set_cascades_to_the_root_holder() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let cto = root.focus(cto_lens());
        let name = cto.focus(person_name_lens());

        name.set_current("brad".to_owned()).unwrap();

        assert_eq!(doc.borrow().company.cto.name, "brad");
        assert_eq!(doc.borrow().company.name, "Microsoft");
        assert_eq!(name.current().unwrap(), "brad");
        assert_eq!(cto.current().unwrap().name, "brad");
    }

    #[test]
    fn current_is_always_fresh() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());

        doc.borrow_mut().company.cto.name = "edited externally".to_owned();
        assert_eq!(name.current().unwrap(), "edited externally");
    }

    #[test]
    fn each_lens_notifies_once_root_first() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let cto = root.focus(cto_lens());
        let name = cto.focus(person_name_lens());

        let order = Rc::new(RefCell::new(Vec::new()));
        let subs = [
            {
                let log = Rc::clone(&order);
                root.changes().watch(Box::new(move |e| {
                    if matches!(e, Event::Next(_)) {
                        log.borrow_mut().push("root");
                    }
                }))
            },
            {
                let log = Rc::clone(&order);
                cto.changes().watch(Box::new(move |e| {
                    if matches!(e, Event::Next(_)) {
                        log.borrow_mut().push("cto");
                    }
                }))
            },
            {
                let log = Rc::clone(&order);
                name.changes().watch(Box::new(move |e| {
                    if matches!(e, Event::Next(_)) {
                        log.borrow_mut().push("name");
                    }
                }))
            },
        ];

        name.set_current("brad".to_owned()).unwrap();
        assert_eq!(order.borrow().as_slice(), ["root", "cto", "name"]);
        drop(subs);
    }

    #[test]
    fn observer_sees_committed_tree_during_callback() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());

        let doc2 = Rc::clone(&doc);
        let checked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&checked);
        let _sub = root.changes().watch(Box::new(move |e| {
            if matches!(e, Event::Next(_)) {
                assert_eq!(doc2.borrow().company.cto.name, "brad");
                flag.set(true);
            }
        }));

        name.set_current("brad".to_owned()).unwrap();
        assert!(checked.get());
    }

    #[test]
    fn detached_root_fails_every_operation() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());

        drop(doc);
        assert_eq!(name.current(), Err(LensError::Detached));
        assert_eq!(
            name.set_current("brad".to_owned()),
            Err(LensError::Detached)
        );
    }

    #[test]
    fn property_lens_rejects_dotted_selectors() {
        let doc = document();
        let err = PropertyLens::new(
            &doc,
            "company.cto",
            |d: &Document| d.company.clone(),
            |d, v| d.company = v,
        )
        .err();
        assert_eq!(
            err,
            Some(LensError::MultiSegment {
                field: "company.cto".to_owned()
            })
        );
    }

    #[test]
    fn set_preserves_off_path_sharing() {
        let doc = document();
        let before = Rc::clone(&doc.borrow().company.cto.badge);
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());

        name.set_current("brad".to_owned()).unwrap();
        assert!(Rc::ptr_eq(&before, &doc.borrow().company.cto.badge));
    }

    #[test]
    fn lens_channel_replays_current_to_new_subscribers() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());
        let chan = lens_channel(name as Rc<dyn LensNode<String>>);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = chan.watch(Box::new(move |e| {
            if let Event::Next(v) = e {
                sink.borrow_mut().push(v);
            }
        }));
        assert_eq!(seen.borrow().as_slice(), ["john smith".to_owned()]);
    }

    #[test]
    fn lens_channel_sink_writes_through() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());
        let chan = lens_channel(name as Rc<dyn LensNode<String>>);

        chan.push("brad".to_owned());
        assert_eq!(doc.borrow().company.cto.name, "brad");
    }

    #[test]
    fn lens_channel_surfaces_detached_writes_as_failure() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        let name = root.focus(cto_lens()).focus(person_name_lens());
        let chan = lens_channel(name as Rc<dyn LensNode<String>>);

        let failed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&failed);
        let _sub = chan.watch(Box::new(move |e| {
            if matches!(e, Event::Failed(_)) {
                flag.set(true);
            }
        }));

        drop(doc);
        chan.push("brad".to_owned());
        assert!(failed.get());
    }

    #[test]
    fn focus_is_lazy() {
        let doc = document();
        let root = property_lens!(doc, company).unwrap();
        // Deriving handles performs no reads or writes.
        let _name = root.focus(cto_lens()).focus(person_name_lens());
        assert_eq!(doc.borrow().company.cto.name, "john smith");
    }
}
