//! Request routing.
//!
//! The [`Router`] is generic over the handler type so the matching rules can
//! be used (and tested) independently of the server.

mod error;
mod params;
mod pattern;
mod route_table;

pub use error::{ConversionError, RouteError};
pub use params::{ParamValue, Params};
pub use pattern::{ParamKind, PathPattern, Segment};
pub use route_table::{DynamicRoute, MatchOutcome, Router};
