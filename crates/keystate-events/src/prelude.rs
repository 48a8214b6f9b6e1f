//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystate_events::prelude::*;` to import all essential types.

pub use crate::{EventRegistry, Listener, ListenerId, StateEvent};
