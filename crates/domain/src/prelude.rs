//! Prelude module for convenient imports.
pub use crate::entities::*;
pub use crate::enums::*;
pub use crate::error::ValidationError;
pub use crate::value_objects::*;
