//! Keystate Events - change notification for state façades.
//!
//! Every façade owns one [`EventRegistry`]. Listeners subscribe by key
//! (the event name is the state key) and receive a [`StateEvent`] whenever
//! that key is set, removed or cleared.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use keystate_core::{ProviderKind, StateValue};
//! use keystate_events::{EventRegistry, StateEvent};
//!
//! let registry = EventRegistry::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&hits);
//!
//! registry.once("theme", move |_event: &StateEvent| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let event = StateEvent::set("theme", StateValue::from("dark"), ProviderKind::Memory);
//! registry.emit("theme", &event);
//! registry.emit("theme", &event);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod event;
mod registry;

pub use event::StateEvent;
pub use registry::{EventRegistry, Listener, ListenerId};
