#![forbid(unsafe_code)]

//! In-process registry for enumeration-like reference data.
//!
//! An [`EnumsManager`] holds id/value pairs that originate locally or are
//! fetched asynchronously from a remote source exactly once, then cached.
//! The data can be filtered into named derived views ("getters"), tagged
//! with symbolic aliases, and is re-broadcast to subscribers on every
//! update. Containers are shared handles overwritten in place, so a handle
//! obtained before an update observes the post-update contents.
//!
//! ```
//! use enumstore::{Entity, EnumId, EnumsManager};
//!
//! let manager = EnumsManager::new(vec![
//!     Entity::new(1, "Draft"),
//!     Entity::new(2, "Final"),
//! ]);
//! manager
//!     .set_symbols([("default_status", EnumId::from(1))])?
//!     .set_getter("finals", |e, _, _| e.value == "Final");
//!
//! manager.update_enums(vec![
//!     Entity::new(1, "Draft"),
//!     Entity::new(2, "Final"),
//!     Entity::new(3, "Archived"),
//! ])?;
//!
//! assert_eq!(manager.enums().len(), 3);
//! assert_eq!(manager.getters().get("finals").unwrap().len(), 1);
//! assert_eq!(manager.entity_for_symbol("default_status").unwrap().value, "Draft");
//! # Ok::<(), enumstore::EnumsError>(())
//! ```
//!
//! Remote loading is lazy: a fetch procedure registered with
//! [`EnumsManager::set_fetch_callback`] runs at most once per arming, on the
//! first read of [`enums`](EnumsManager::enums) /
//! [`getters`](EnumsManager::getters) or via
//! [`wait_for_enums`](EnumsManager::wait_for_enums). Triggering a fetch
//! spawns a local task and therefore requires a current-thread runtime
//! inside a [`tokio::task::LocalSet`].

pub mod entity;
pub mod error;
pub mod list;
pub mod manager;

pub use entity::{Entity, EnumId};
pub use error::{EnumsError, Result};
pub use list::{EnumList, GetterViews};
pub use manager::{EnumsManager, GetterFn, LoadState};
