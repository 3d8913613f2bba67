//! The default process-wide store.
//!
//! The `Store` type is a first-class object and any number of stores can coexist, but most hosts
//! want exactly one. This module is that one: four free functions over a process-wide store, the
//! shape a system-call layer would expose.

use slog::{Discard, Logger};

use error::Result;
use store::Store;
use user::{Sink, Source};

lazy_static! {
    /// The process-wide store.
    ///
    /// Its log is discarded; construct a `Store` directly to attach a logger.
    static ref STORE: Store = Store::new(Logger::root(Discard, o!()));
}

/// Initialize the process-wide store. See `Store::init`.
pub fn init(flags: u32) -> Result<()> {
    STORE.init(flags)
}

/// Destroy the process-wide store, returning the number of entries freed. See `Store::destroy`.
pub fn destroy(flags: u32) -> Result<usize> {
    STORE.destroy(flags)
}

/// Insert or replace a value in the process-wide store. See `Store::put`.
pub fn put<S: Source + ?Sized>(key: u32, val: &S, flags: u32) -> Result<()> {
    STORE.put(key, val, flags)
}

/// Remove and fetch a value from the process-wide store. See `Store::get`.
pub fn get<D: Sink + ?Sized>(key: u32, dst: &mut D, flags: u32) -> Result<()> {
    STORE.get(key, dst, flags)
}
