//! Keystate Core - value codec and cast rules shared by every state façade.
//!
//! This crate provides:
//! - [`StateValue`], the typed value handed to and returned from a façade
//! - [`Cast`] and [`resolve_cast`], the single decision on how a stored
//!   string is read back
//! - [`codec::decode`] / [`codec::encode`], the read and write contract
//! - [`StateError`], the two strict-mode conditions plus backend failures
//!
//! # Example
//!
//! ```rust
//! use keystate_core::{Cast, GetOptions, ProviderKind, StateValue, codec};
//!
//! let stored = codec::encode(&StateValue::from(25));
//! assert_eq!(stored, "25");
//!
//! let provider = ProviderKind::Memory;
//! let plain = codec::decode("age", Some(&stored), &GetOptions::new(), &provider).unwrap();
//! assert_eq!(plain, Some(StateValue::from("25")));
//!
//! let number = codec::decode("age", Some(&stored), &GetOptions::new().cast(Cast::Number), &provider)
//!     .unwrap();
//! assert_eq!(number, Some(StateValue::Number(25.0)));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod cast;
pub mod codec;
pub mod error;
pub mod options;
pub mod provider;
pub mod value;

pub use cast::{Cast, resolve_cast};
pub use error::{StateError, StateResult};
pub use options::GetOptions;
pub use provider::ProviderKind;
pub use value::StateValue;
