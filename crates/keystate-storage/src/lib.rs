//! Keystate Storage - string key-value backends.
//!
//! Every store implements [`StorageBackend`]: a small synchronous
//! get/set/remove/clear/keys contract over encoded strings. Backends:
//!
//! - [`MemoryBackend`]: process-lifetime map, used for memory and session state
//! - [`FileBackend`]: JSON file on disk, used for local state
//! - [`ScopedBackend`]: namespace-prefixed view over any other backend
//! - [`CookieBackend`]: cookie document (`name=value; ...`) with attributes
//!
//! # Example
//!
//! ```rust
//! use keystate_storage::{MemoryBackend, ScopedBackend, StorageBackend};
//!
//! let scoped = ScopedBackend::new(MemoryBackend::new(), "app")?;
//! scoped.set_item("theme", "dark")?;
//! assert_eq!(scoped.get_item("theme")?.as_deref(), Some("dark"));
//! assert_eq!(scoped.inner().keys()?, vec!["app:theme"]);
//! # Ok::<(), keystate_storage::StorageError>(())
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cookie;
pub mod error;

mod backend;
mod file;
mod memory;
mod scoped;

pub use backend::StorageBackend;
pub use cookie::{
    CookieBackend, CookieDocument, CookieOptions, Expires, MemoryCookieJar, SameSite,
    StoredCookie,
};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use scoped::{ScopedBackend, validate_namespace};
