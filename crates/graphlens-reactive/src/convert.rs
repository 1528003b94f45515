//! Leaf converters and the static converter registry.
//!
//! Concrete [`TwoWayConvert`] instances for the common binding shapes:
//! enum ⇄ display label, enum ⇄ declared position, and primitive ⇄ string
//! via `Display`/`FromStr`. The [`ConverterRegistry`] replaces any
//! ambient type-conversion lookup with an explicit table keyed by
//! `(source, target)` type, resolved once at binding-construction time.
//!
//! # Invariants
//!
//! 1. [`VariantList::index`] is the position in the declared variant
//!    list, not the discriminant value.
//! 2. Parsing an unknown label or out-of-range index fails with
//!    [`ConvertError::Parse`]; it never panics.
//! 3. Registry resolution happens at construction; a missing pair is
//!    [`ConvertError::Unsupported`], raised before any value flows.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConvertError;
use crate::transform::TwoWayConvert;

/// A unit enum with an enumerable, labeled variant list.
///
/// Usually implemented via [`variant_list!`].
pub trait VariantList: Sized + Copy + PartialEq + 'static {
    /// All variants, in declaration order.
    const VARIANTS: &'static [Self];

    /// The display label of this variant.
    fn label(&self) -> &'static str;

    /// Find a variant by exact label.
    fn from_label(label: &str) -> Result<Self, ConvertError> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.label() == label)
            .ok_or_else(|| ConvertError::parse(label, type_name::<Self>()))
    }

    /// Position of this variant in the declared list.
    ///
    /// # Panics
    ///
    /// Panics if the variant is missing from [`VariantList::VARIANTS`],
    /// which a well-formed implementation cannot produce.
    #[must_use]
    fn index(&self) -> usize {
        Self::VARIANTS
            .iter()
            .position(|v| v == self)
            .expect("variant listed in VARIANTS")
    }

    /// The variant at `index` in the declared list.
    fn from_index(index: usize) -> Result<Self, ConvertError> {
        Self::VARIANTS
            .get(index)
            .copied()
            .ok_or_else(|| ConvertError::parse(index, type_name::<Self>()))
    }
}

/// Implement [`VariantList`] for a unit enum.
///
/// ```ignore
/// variant_list! { Fruit { Apple, Orange, Banana } }
/// ```
#[macro_export]
macro_rules! variant_list {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::VariantList for $ty {
            const VARIANTS: &'static [Self] = &[$($ty::$variant),+];

            fn label(&self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

/// Enum ⇄ label converter: formats by variant label, parses by exact
/// label match.
#[must_use]
pub fn variant_text<E: VariantList>() -> TwoWayConvert<E, String> {
    TwoWayConvert::new(
        |e: &E| e.label().to_owned(),
        |s: &String| E::from_label(s),
    )
}

/// Enum ⇄ declared-position converter.
#[must_use]
pub fn variant_index<E: VariantList>() -> TwoWayConvert<E, usize> {
    TwoWayConvert::new(|e: &E| e.index(), |i: &usize| E::from_index(*i))
}

/// Value ⇄ string converter via `Display`/`FromStr`.
#[must_use]
pub fn parsed_text<V>() -> TwoWayConvert<V, String>
where
    V: Display + FromStr + 'static,
{
    TwoWayConvert::new(
        |v: &V| v.to_string(),
        |s: &String| {
            s.parse::<V>()
                .map_err(|_| ConvertError::parse(s, type_name::<V>()))
        },
    )
}

/// An explicit converter table keyed by `(source, target)` type.
///
/// Registered once, resolved at binding-construction time; no per-value
/// lookup happens after a pair is resolved.
#[derive(Default)]
pub struct ConverterRegistry {
    table: HashMap<(TypeId, TypeId), Box<dyn Any>>,
}

impl ConverterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with the primitive ⇄ string pairs
    /// (`i32`, `i64`, `u32`, `u64`, `f64`, `bool`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(parsed_text::<i32>());
        registry.register(parsed_text::<i64>());
        registry.register(parsed_text::<u32>());
        registry.register(parsed_text::<u64>());
        registry.register(parsed_text::<f64>());
        registry.register(parsed_text::<bool>());
        registry
    }

    /// Register a converter pair; replaces any previous registration for
    /// the same `(S, T)`.
    pub fn register<S: 'static, T: 'static>(&mut self, convert: TwoWayConvert<S, T>) {
        self.table
            .insert((TypeId::of::<S>(), TypeId::of::<T>()), Box::new(convert));
    }

    /// Resolve the converter for `(S, T)`.
    pub fn resolve<S: 'static, T: 'static>(&self) -> Result<TwoWayConvert<S, T>, ConvertError> {
        self.table
            .get(&(TypeId::of::<S>(), TypeId::of::<T>()))
            .and_then(|any| any.downcast_ref::<TwoWayConvert<S, T>>())
            .cloned()
            .ok_or(ConvertError::Unsupported {
                from: type_name::<S>(),
                to: type_name::<T>(),
            })
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the registry has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("pairs", &self.table.len())
            .finish()
    }
}
