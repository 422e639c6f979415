//! What the engine hands to a renderer, and what it gets back.
//!
//! The renderer itself lives outside this workspace; it receives complete
//! [`RenderFrame`]s through a [`RenderSink`] and reports hovers as
//! [`PointerEvent`]s.

pub mod frame;
pub mod sink;

pub use frame::*;
pub use sink::*;
