//! Hash table entries.

use std::thread::{self, Thread};

use parking_lot::{Mutex, MutexGuard};

use pair::Pair;

/// A node of a bucket list.
///
/// An entry owns a pair slot and hosts the state a blocking get needs: a roster of sleeping
/// threads and a flag recording whether the entry is still linked into a bucket. Two shapes are
/// observable: *full* (the pair holds a live value, possibly zero-length) and *empty* (the pair is
/// a placeholder a blocking get linked in so it has something to sleep on).
///
/// Entries are handed around as `Arc<Entry>`. The bucket holds one handle and every waiter holds
/// one, so an entry that `destroy` has torn out of its bucket stays addressable until the last
/// waiter lets go. The strong count is the reference count the detachment protocol needs, and the
/// final drop is the free.
pub struct Entry {
    /// The key, fixed at creation.
    key: u32,
    /// The guarded state.
    ///
    /// Linked entries are mutated under their bucket's lock followed by this one; detached entries
    /// have only this one, which is exactly why it exists as a separate lock.
    state: Mutex<EntryState>,
}

/// The lock-guarded state of an entry.
pub struct EntryState {
    /// The pair slot.
    pub pair: Pair,
    /// Is the entry linked into a bucket?
    ///
    /// Cleared when a get removes the entry, when the last waiter unlinks a placeholder, and when
    /// a destroy tears the table down. A waiter that wakes to find this cleared knows its
    /// rendezvous is off.
    pub linked: bool,
    /// The threads sleeping on this entry. The roster length is the waiter count.
    waiters: Vec<Thread>,
}

impl Entry {
    /// Create an entry: an empty pair under `key`, unlinked, with a fresh roster.
    pub fn new(key: u32) -> Entry {
        Entry {
            key: key,
            state: Mutex::new(EntryState {
                pair: Pair::empty(key),
                linked: false,
                waiters: Vec::new(),
            }),
        }
    }

    /// The key.
    pub fn key(&self) -> u32 {
        self.key
    }

    /// Lock the state.
    pub fn lock(&self) -> MutexGuard<EntryState> {
        self.state.lock()
    }
}

impl EntryState {
    /// The number of sleeping threads.
    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    /// Put the calling thread on the roster.
    pub fn register(&mut self) {
        self.waiters.push(thread::current());
    }

    /// Take the calling thread off the roster.
    pub fn deregister(&mut self) {
        let me = thread::current().id();
        if let Some(at) = self.waiters.iter().position(|thread| thread.id() == me) {
            self.waiters.swap_remove(at);
        }
    }

    /// Wake every thread on the roster.
    ///
    /// Unparking does not allocate, so this is safe to call from inside a bucket critical section.
    /// Woken threads stay on the roster; they take themselves off once they have somewhere to go.
    pub fn wake_all(&self) {
        for thread in &self.waiters {
            thread.unpark();
        }
    }

    /// Detach the entry during table teardown: drop the value, clear the linkage, and wake every
    /// waiter so it can observe the detachment.
    pub fn detach(&mut self) {
        self.pair.free();
        self.linked = false;
        self.wake_all();
    }
}
