//! Prelude module - commonly used types for convenient import.
//!
//! Use `use ferry_core::prelude::*;` to import all essential types.

pub use crate::{AddOutcome, AdminSet, RemoveOutcome};
pub use crate::{ParseUserIdError, UserId};
