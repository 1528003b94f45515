#![forbid(unsafe_code)]

//! Reactive lens chains and bidirectional channel bindings.
//!
//! This crate layers change propagation on top of the pure lenses in
//! `graphlens-core`:
//!
//! - [`channel`]: the two-ended channel abstraction — [`Event`],
//!   [`Subject`] (hot multicast), [`Relay`] (independent sink + source
//!   pair), and RAII [`Subscription`]s.
//! - [`transform`]: channel transformation — [`TwoWayConvert`] converter
//!   pairs, [`select`] with out-of-band error reporting, and [`switch`] /
//!   [`select_dynamic`] for time-varying converters.
//! - [`bind`]: the two-way binding protocol with loop suppression,
//!   initial-state arbitration, and right-side validation gating.
//! - [`lens`]: the reactive lens chain — [`LensNode`], [`FocusedLens`],
//!   the [`PropertyLens`] root terminal, and the channel bridge.
//! - [`convert`]: leaf converters (enum ⇄ label, enum ⇄ declared index,
//!   primitive ⇄ string) and the static [`ConverterRegistry`].
//! - [`scheduler`]: the injected dispatch seam replacing any ambient
//!   UI-thread scheduler.
//!
//! # Architecture
//!
//! Everything is single-threaded: `Rc`/`RefCell` shared ownership, and
//! every push is a synchronous, re-entrant call on the calling thread.
//! Within one binding link, pushes are strictly serialized in issue order;
//! nothing is buffered, coalesced, or reordered. Feedback cycles are cut
//! by the binding's equality-based dedupe cache, so converters and
//! validators must not push into the channels they wrap.
//!
//! # Error model
//!
//! Conversion failures never unwind out of a binding link: they are caught
//! at the [`select`] boundary and redirected into an explicit error
//! channel. Path and stale-reference errors, by contrast, are fatal and
//! surface as `Result`s at the call site.

pub mod bind;
pub mod channel;
pub mod convert;
pub mod error;
pub mod lens;
pub mod scheduler;
pub mod transform;

pub use bind::{BindingGuard, two_way_bind, two_way_bind_validated};
pub use channel::{
    Channel, ChannelError, ChannelSink, ChannelSource, Event, Relay, Subject, Subscription,
    sink_from_fn,
};
pub use convert::{ConverterRegistry, VariantList, parsed_text, variant_index, variant_text};
pub use error::{ConvertError, LensError};
pub use lens::{FocusedLens, LensNode, PropertyLens, focus, lens_channel};
pub use scheduler::{InlineScheduler, QueueScheduler, Scheduler};
pub use transform::{ErrorSink, TwoWayConvert, select, select_dynamic, select_on, switch};
