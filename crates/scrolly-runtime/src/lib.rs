#![forbid(unsafe_code)]

//! Story runtime: step mapping, content resolution and the content bus.
//!
//! # Data flow
//!
//! ```text
//! scroll observer ──StepEvent──► StorySession
//!                                  │ StepMapper      index ⇄ step name
//!                                  │ ChartResolver   step config → ChartUpdate
//!                                  ▼
//!                                 Bus ──► ChartHandler / MapHandler / ImageHandler
//!                                                        │
//!                                                        └─ MapViewDriver (camera)
//! ```
//!
//! Everything is single-threaded and driven by the host: scroll callbacks call
//! into the session, the frame clock calls [`handlers::ContentHandler::tick`].

pub mod bus;
pub mod config;
pub mod handlers;
pub mod map_view;
pub mod presence;
pub mod resolve;
pub mod session;
pub mod step_mapper;

pub use bus::{Bus, Message, SubscriptionId, Topic};
pub use config::{ConfigError, StoryConfig, UpdateMode};
pub use handlers::{ChartHandler, ContentHandler, ImageHandler, MapHandler};
pub use map_view::{MapViewDriver, Projection, ProjectionViewState, SettleAction, animate_view};
pub use presence::{Placement, Positioned, Presence};
pub use resolve::{ChartResolver, ChartUpdate, DataSource, ResolveError};
pub use session::StorySession;
pub use step_mapper::{DynamicRange, StepDefinition, StepKind, StepMapError, StepMapper, StepMapping};
