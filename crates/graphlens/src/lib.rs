#![forbid(unsafe_code)]

//! Functional lenses and reactive two-way binding over immutable object
//! graphs.
//!
//! `graphlens` keeps two worlds consistent: a tree of immutable, nested
//! values updated non-destructively through composable lenses, and one or
//! more mutable, change-notifying endpoints synchronized through a
//! pipeline of converters with structured error propagation and
//! feedback-loop suppression.
//!
//! The crates split along that line:
//!
//! - [`graphlens_core`] (re-exported here): pure [`Lens`] pairs,
//!   [`field_lens!`], dynamic [`FieldPath`]s and the [`Structural`]
//!   updater bridge.
//! - [`graphlens_reactive`] (re-exported here): [`Subject`] channels,
//!   [`select`]/[`switch`] transformation, [`two_way_bind`], the
//!   [`PropertyLens`]/[`FocusedLens`] chain, and the leaf converters.
//!
//! ```ignore
//! use graphlens::prelude::*;
//!
//! let doc = Rc::new(RefCell::new(Document::default()));
//! let company = property_lens!(doc, company)?;
//! let cto_name = company
//!     .focus(field_lens!(Company, cto))
//!     .focus(field_lens!(Person, name));
//!
//! cto_name.set_current("brad".to_owned())?;
//! ```

pub use graphlens_core::{
    FieldPath, Lens, PathError, Structural, field_lens, impl_structural, path_get, with_props,
};
pub use graphlens_reactive::{
    BindingGuard, Channel, ChannelError, ChannelSink, ChannelSource, ConvertError,
    ConverterRegistry, ErrorSink, Event, FocusedLens, InlineScheduler, LensError, LensNode,
    PropertyLens, QueueScheduler, Relay, Scheduler, Subject, Subscription, TwoWayConvert,
    VariantList, focus, lens_channel, parsed_text, property_lens, select, select_dynamic,
    select_on, switch, two_way_bind, two_way_bind_validated, variant_index, variant_list,
    variant_text,
};

/// Everything needed for typical binding setups.
pub mod prelude {
    pub use graphlens_core::{
        FieldPath, Lens, PathError, Structural, field_lens, impl_structural, path_get, with_props,
    };
    pub use graphlens_reactive::{
        BindingGuard, Channel, ChannelError, ChannelSink, ChannelSource, ConvertError,
        ConverterRegistry, ErrorSink, Event, FocusedLens, LensError, LensNode, PropertyLens,
        Subject, Subscription, TwoWayConvert, VariantList, focus, lens_channel, property_lens,
        select, select_dynamic, two_way_bind, two_way_bind_validated, variant_index, variant_list,
        variant_text,
    };
}
