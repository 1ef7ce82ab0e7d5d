#![forbid(unsafe_code)]

//! Scrolly public facade crate.
//!
//! Re-exports the types a host needs to run a scrollytelling story and a
//! prelude for everyday use. Without the `runtime` feature only geometry,
//! layout and label placement are available.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use scrolly_core::animation::{Animation, Easing, Tween};
pub use scrolly_core::event::{Direction, StepEvent, StepProgress};
pub use scrolly_core::geometry::{Point, Rect, Sides, Size};

// --- Layout re-exports -----------------------------------------------------

pub use scrolly_layout::labels::{
    InlineLabeler, LabelPlan, LeaderLine, PlacementError, Series, place_labels,
};
pub use scrolly_layout::{
    CompositeLayout, Label, LabelConfig, LabelStrategy, LayoutError, LayoutGeometry, LayoutKind,
    Length, MarginSpec, SizeLimits, compute_geometry,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use scrolly_runtime::{
    Bus, ChartUpdate, ConfigError, ContentHandler, DataSource, Message, ProjectionViewState,
    ResolveError, StepMapError, StepMapper, StoryConfig, StorySession, Topic,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for scrolly hosts.
#[derive(Debug)]
pub enum Error {
    Layout(LayoutError),
    Placement(PlacementError),
    #[cfg(feature = "runtime")]
    Config(ConfigError),
    #[cfg(feature = "runtime")]
    StepMap(StepMapError),
    #[cfg(feature = "runtime")]
    Resolve(ResolveError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "{err}"),
            Self::Placement(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::StepMap(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Resolve(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Placement(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::StepMap(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Resolve(err) => Some(err),
        }
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<PlacementError> for Error {
    fn from(err: PlacementError) -> Self {
        Self::Placement(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "runtime")]
impl From<StepMapError> for Error {
    fn from(err: StepMapError) -> Self {
        Self::StepMap(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err)
    }
}

/// Standard result type for scrolly APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Direction, Error, Label, LabelConfig, LayoutGeometry, LayoutKind, MarginSpec, Point, Rect,
        Result, Size, SizeLimits, StepEvent, StepProgress, compute_geometry, place_labels,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{Message, StepMapper, StoryConfig, StorySession, Topic};

    pub use crate::{core, layout};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use scrolly_core as core;
pub use scrolly_layout as layout;
#[cfg(feature = "runtime")]
pub use scrolly_runtime as runtime;
