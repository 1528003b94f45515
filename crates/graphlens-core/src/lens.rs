//! Typed lenses: composable get/set pairs over immutable values.
//!
//! A [`Lens`] pairs a pure reader with a pure rebuilder. Lenses compose
//! with [`Lens::then`], so a deep location is addressed by chaining one
//! per-field lens per hop instead of walking names at runtime.
//!
//! # Invariants
//!
//! 1. `get` and `set` are pure; `set` returns a new root and never touches
//!    the old one.
//! 2. `then` is associative: `(a.then(b)).then(c)` behaves exactly like
//!    `a.then(b.then(c))`.
//! 3. A lens built from a validated [`FieldPath`] behaves identically to
//!    the equivalent `then` chain of typed field lenses.

use std::any::Any;
use std::rc::Rc;

use crate::error::PathError;
use crate::path::FieldPath;
use crate::structural::{Structural, path_get, with_props};

/// A composable accessor/updater pair addressing one location in an
/// immutable structure of type `R`.
///
/// Cloning a lens is cheap; both halves are shared behind `Rc`.
pub struct Lens<R, T> {
    get: Rc<dyn Fn(&R) -> T>,
    set: Rc<dyn Fn(&R, T) -> R>,
}

impl<R, T> Clone for Lens<R, T> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            set: Rc::clone(&self.set),
        }
    }
}

impl<R: 'static, T: 'static> Lens<R, T> {
    /// Build a lens from an explicit get/set pair.
    pub fn new(get: impl Fn(&R) -> T + 'static, set: impl Fn(&R, T) -> R + 'static) -> Self {
        Self {
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }

    /// Read the target out of `root`.
    #[must_use]
    pub fn get(&self, root: &R) -> T {
        (self.get)(root)
    }

    /// Rebuild `root` with the target replaced by `value`.
    ///
    /// Every ancestor along the path to the target is rebuilt; everything
    /// else is shared with the original.
    #[must_use]
    pub fn set(&self, root: &R, value: T) -> R {
        (self.set)(root, value)
    }

    /// Compose with a lens from `T` down to `U`, yielding a lens from `R`
    /// to `U`.
    #[must_use]
    pub fn then<U: 'static>(&self, child: Lens<T, U>) -> Lens<R, U> {
        let outer = self.clone();
        let outer_set = self.clone();
        let child_set = child.clone();
        Lens {
            get: Rc::new(move |root: &R| child.get(&outer.get(root))),
            set: Rc::new(move |root: &R, value: U| {
                let mid = outer_set.get(root);
                outer_set.set(root, child_set.set(&mid, value))
            }),
        }
    }
}

impl<R, T> Lens<R, T>
where
    R: Structural + Clone,
    T: Any + Clone,
{
    /// Build a lens from a dynamic string path, validated against a
    /// prototype root at construction.
    ///
    /// The full path is resolved once against `prototype`: every segment
    /// must name a field (case-insensitively), intermediate segments must
    /// be structural nodes, and the leaf must hold a `T`. Resolution
    /// failures surface here as [`PathError`], not later at use sites.
    ///
    /// # Panics
    ///
    /// The returned closures re-walk the path on every call. Field sets
    /// are static per type, so after construction-time validation a walk
    /// can only fail if a [`Structural`] impl reports different fields for
    /// different instances of the same type; that is a contract violation
    /// and panics.
    pub fn from_path(prototype: &R, path: &FieldPath) -> Result<Self, PathError> {
        let current: T = path_get(prototype, path)?;
        // Round-trip the prototype's own value to validate the set side.
        with_props(prototype, path, current)?;

        let get_path = path.clone();
        let set_path = path.clone();
        Ok(Self {
            get: Rc::new(move |root: &R| {
                path_get(root, &get_path).expect("path validated at construction")
            }),
            set: Rc::new(move |root: &R, value: T| {
                with_props(root, &set_path, value).expect("path validated at construction")
            }),
        })
    }
}

/// Build a typed [`Lens`] for one named field of a `Clone` struct.
///
/// The set side clones the root and replaces the one field, so all
/// sibling fields are copied (and `Rc`-typed siblings stay shared).
///
/// ```ignore
/// let name = field_lens!(Person, name);
/// let renamed = name.set(&person, "brad".to_owned());
/// ```
#[macro_export]
macro_rules! field_lens {
    ($ty:path, $field:ident) => {
        $crate::Lens::new(
            |root: &$ty| root.$field.clone(),
            |root: &$ty, value| {
                let mut next = root.clone();
                next.$field = value;
                next
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

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

    fn company() -> Company {
        Company {
            name: "Microsoft".to_owned(),
            cto: Person {
                name: "john smith".to_owned(),
                badge: Rc::new(7),
            },
        }
    }

    #[test]
    fn field_lens_get_set_round_trip() {
        let name = field_lens!(Company, name);
        let c = company();
        assert_eq!(name.get(&c), "Microsoft");

        let c2 = name.set(&c, "Weingartner".to_owned());
        assert_eq!(name.get(&c2), "Weingartner");
        assert_eq!(c.name, "Microsoft", "original must be untouched");
    }

    #[test]
    fn then_composes_two_hops() {
        let cto_name = field_lens!(Company, cto).then(field_lens!(Person, name));
        let c = company();

        let c2 = cto_name.set(&c, "brad".to_owned());
        assert_eq!(cto_name.get(&c2), "brad");
        assert_eq!(c2.cto.name, "brad");
        assert_eq!(c2.name, "Microsoft");
        assert_eq!(c.cto.name, "john smith");
    }

    #[test]
    fn set_shares_off_path_siblings() {
        let cto_name = field_lens!(Company, cto).then(field_lens!(Person, name));
        let c = company();
        let c2 = cto_name.set(&c, "brad".to_owned());
        assert!(
            Rc::ptr_eq(&c.cto.badge, &c2.cto.badge),
            "sibling field of the rebuilt node must stay shared"
        );
    }

    #[test]
    fn set_get_is_identity_on_unchanged_value() {
        let cto_name = field_lens!(Company, cto).then(field_lens!(Person, name));
        let c = company();
        let c2 = cto_name.set(&c, cto_name.get(&c));
        assert_eq!(c, c2);
    }
}
