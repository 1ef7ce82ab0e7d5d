#![forbid(unsafe_code)]

//! Core: geometry, scroll step events, and animation primitives.
//!
//! Everything here is pure computation. The drawing surface, the DOM and the
//! scroll observer live outside this workspace; they talk to the rest of the
//! crates through the plain data types defined in this crate.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, warn};
