//! A typed object pool with compile-time fixed capacity and pinned items.
//!
//! This crate provides [`FixedPool`], an object pool that reserves storage for all of its
//! slots when it is created and never allocates again. Items are constructed in place on
//! insertion and dropped in place on removal, making the pool suitable as a hot-path
//! allocation primitive where a general-purpose allocator is too slow or not allowed.
//!
//! # Key Features
//!
//! - **Fixed capacity**: The slot count is a compile-time constant; the pool never grows,
//!   shrinks, or relocates its storage
//! - **Recoverable exhaustion**: Insertion into a full pool returns [`Error::Exhausted`]
//!   instead of panicking - running out of slots is a normal runtime condition
//! - **Stable memory addresses**: Items never move once inserted (always pinned)
//! - **Opaque keys**: Insertion returns a [`Key`] that identifies the slot; access and
//!   removal go through the key, with no pointer arithmetic anywhere in the contract
//! - **Automatic value dropping**: Items are properly dropped when removed or when the
//!   pool is dropped
//! - **O(1) insert and remove**: Free slots form an intrusive freelist; no operation
//!   scans the storage
//! - **Flexible drop policies**: Configure behavior when the pool is dropped with
//!   remaining items
//! - **Thread mobility**: The pool can be moved between threads (but not shared without
//!   synchronization)
//!
//! # Contract violations versus expected failures
//!
//! The two failure classes are kept strictly apart:
//!
//! - Inserting into a full pool is *expected* and reported via [`Result`] on the return
//!   channel.
//! - Passing an invalid key to [`get()`](FixedPool::get), [`get_mut()`](FixedPool::get_mut)
//!   or [`remove()`](FixedPool::remove) - out of bounds, already removed, or from another
//!   pool - is a *caller bug* and panics with a diagnostic, because silently continuing
//!   would corrupt the occupied/vacant slot partition.
//!
//! # Examples
//!
//! ## Basic usage
//!
//! ```rust
//! use fixed_pool::FixedPool;
//!
//! // Create a pool with 4 slots for String values.
//! let mut pool = FixedPool::<String, 4>::new();
//!
//! let key = pool.insert("Hello, World!".to_string()).unwrap();
//!
//! // Access the value through its key.
//! assert_eq!(&*pool.get(key), "Hello, World!");
//!
//! // Remove the value; the slot becomes available for reuse.
//! pool.remove(key);
//! assert!(pool.is_empty());
//! ```
//!
//! ## Handling exhaustion
//!
//! ```rust
//! use fixed_pool::{Error, FixedPool};
//!
//! let mut pool = FixedPool::<u64, 2>::new();
//!
//! let first = pool.insert(1).unwrap();
//! let _second = pool.insert(2).unwrap();
//!
//! // The pool is full; the next insertion reports exhaustion instead of panicking.
//! match pool.insert(3) {
//!     Err(Error::Exhausted { capacity }) => assert_eq!(capacity, 2),
//!     other => panic!("expected exhaustion, got {other:?}"),
//! }
//!
//! // Releasing a slot makes insertion possible again.
//! pool.remove(first);
//! assert!(pool.insert(3).is_ok());
//! ```
//!
//! ## Reserving a slot before constructing the value
//!
//! ```rust
//! use fixed_pool::FixedPool;
//!
//! let mut pool = FixedPool::<String, 2>::new();
//!
//! // `begin_insert()` checks for exhaustion before the value exists, so an expensive
//! // value constructor only runs once a slot is guaranteed.
//! let inserter = pool.begin_insert().unwrap();
//! let key = inserter.key();
//! let item = inserter.insert("expensive".repeat(100));
//!
//! assert_eq!(item.len(), 900);
//! # pool.remove(key);
//! ```

mod builder;
mod drop_policy;
mod error;
mod pool;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use pool::*;
