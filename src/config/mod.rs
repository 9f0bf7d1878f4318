//! Configuration module
//!
//! Loads and validates stage configuration files: the section list plus
//! layout, timeline, effect, snap and scrub tunables.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
