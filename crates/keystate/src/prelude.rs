//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystate::prelude::*;` to import all essential types.

// Façades
pub use crate::{CookieState, LocalState, MemoryState, SessionState, State, StateHub};

// Values and reads
pub use crate::{Cast, GetOptions, ProviderKind, StateError, StateResult, StateValue};

// Events
pub use crate::{ListenerId, StateEvent};

// Storage
pub use crate::{CookieOptions, MemoryCookieJar, SameSite, StorageBackend};
