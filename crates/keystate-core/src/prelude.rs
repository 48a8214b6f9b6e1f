//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystate_core::prelude::*;` to import all essential types.

pub use crate::{Cast, GetOptions, ProviderKind, StateError, StateResult, StateValue};
