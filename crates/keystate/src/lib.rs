//! Keystate - one key-value contract over memory, session, local and cookie
//! storage.
//!
//! Every façade is a [`State`] over a storage backend. Values are written as
//! encoded strings and read back through the value codec, which applies
//! fallbacks, casts and strict mode. Each façade notifies its own listeners
//! on `set`, `remove` and `clear`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use keystate::prelude::*;
//!
//! # fn main() -> StateResult<()> {
//! let state = State::memory();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! state.on("age", move |event: &StateEvent| {
//!     sink.lock().unwrap().push(event.value.clone());
//! });
//!
//! state.set("age", 25)?;
//! assert_eq!(state.get("age", GetOptions::new())?, Some(StateValue::from("25")));
//! assert_eq!(
//!     state.get("age", GetOptions::new().cast(Cast::Number))?,
//!     Some(StateValue::Number(25.0))
//! );
//! assert_eq!(
//!     state.get("missing", GetOptions::new().fallback("none"))?,
//!     Some(StateValue::from("none"))
//! );
//! assert!(state.get("missing", GetOptions::new().strict()).is_err());
//!
//! state.remove("age")?;
//! assert_eq!(seen.lock().unwrap().len(), 2);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod hub;
mod state;

pub use hub::{HubError, HubResult, StateHub, cookie_options, open_local};
pub use state::{CookieState, LocalState, MemoryState, SessionState, State};

pub use keystate_core::{
    Cast, GetOptions, ProviderKind, StateError, StateResult, StateValue, codec,
};
pub use keystate_events::{EventRegistry, ListenerId, StateEvent};
pub use keystate_storage::{
    CookieBackend, CookieDocument, CookieOptions, Expires, FileBackend, MemoryBackend,
    MemoryCookieJar, SameSite, ScopedBackend, StorageBackend,
};
