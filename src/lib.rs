//! The fridge library.
//!
//! This crate implements a concurrent, in-process key-value store (the "fridge") mapping 32-bit
//! unsigned keys to opaque byte strings of any size, including zero. It supports four operations:
//! `init`, `destroy`, `put` (insert-or-replace), and `get` (remove-and-fetch), where `get` may
//! optionally block until a value arrives.
//!
//! The store is a fixed array of buckets, each a short locked list of entries, under a store-wide
//! readers–writers lock that lets puts and gets run in parallel while `init` and `destroy` hold
//! the table exclusively. A blocking `get` on an absent key links a placeholder entry into its
//! bucket and sleeps on it; a later `put` fulfills the placeholder and wakes every waiter, while
//! `destroy` may preempt the waiters at any moment.
//!
//! Most users want either the `Store` type (stores are independent, so tests can spin up as many
//! as they like) or the process-wide default store in `global`.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate slog;
extern crate parking_lot;

mod bucket;
mod buckets;
mod entry;
mod error;
mod flags;
mod pair;
mod store;
mod user;

pub mod global;
pub mod signal;


pub use buckets::DEFAULT_BUCKETS;
pub use error::{Error, Result};
pub use flags::GetFlags;
pub use store::Store;
pub use user::{Sink, Source};
