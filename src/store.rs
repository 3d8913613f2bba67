//! The store.
//!
//! This module ties the table together and carries the two protocols that make it interesting:
//! insert-or-replace (`put`) and remove-and-fetch (`get`), the latter with a blocking mode that
//! rendezvouses with a future put through a placeholder entry.
//!
//! # Locking
//!
//! Two layers. A store-wide readers–writers lock guards the initialization state and the bucket
//! array handle: `init` and `destroy` take the write side, `put` and `get` the read side, and
//! every acquisition is fail-fast. Racing `put`/`get` against `init`/`destroy` is API misuse, and
//! try-locking turns it into a reported `NotPermitted` instead of a silent serialization. Below
//! that, each bucket has its own lock for its entry list, and each entry one for its slot and
//! waiter roster.
//!
//! The lock order is store read side, then bucket, then entry, and waiters release everything
//! before parking. Allocation happens outside all critical sections: values are imported and
//! entries preallocated before any lock, and whatever goes unused is dropped after the locks are
//! gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use slog::Logger;

use bucket::Shelf;
use buckets::{BucketArray, DEFAULT_BUCKETS};
use entry::{Entry, EntryState};
use error::{Error, Result};
use flags::GetFlags;
use pair::Pair;
use signal;
use user::{Sink, Source};

/// A concurrent key-value store.
///
/// A store starts uninitialized. `init` allocates and publishes the bucket array, `destroy` tears
/// it back down (returning how many entries died with it), and the two may alternate freely. In
/// between, any number of threads may put and get in parallel.
pub struct Store {
    /// The log exitpoint.
    log: Logger,
    /// The bucket count used by `init`.
    len: usize,
    /// The unlocked initialization hint.
    ///
    /// This mirrors whether `buckets` is `Some` and exists only for the check-before-lock half of
    /// the fail-fast pattern: a relaxed load that lets misuse bail before touching the lock. The
    /// truth lives under the lock and is always re-checked there.
    initialized: AtomicBool,
    /// The bucket array; `None` while the store is uninitialized.
    ///
    /// The write side publishes and retracts the array; the read side pins it while puts and gets
    /// work the buckets underneath.
    buckets: RwLock<Option<BucketArray>>,
}

/// The outcome of a blocking get's first critical section.
enum Rendezvous {
    /// A full entry was removed from its bucket; this is its pair.
    Taken(Pair),
    /// No value yet; we are on this placeholder's roster and must wait.
    Wait(Arc<Entry>),
}

impl Store {
    /// Create an uninitialized store with the reference bucket count.
    pub fn new(log: Logger) -> Store {
        Store::with_buckets(log, DEFAULT_BUCKETS)
    }

    /// Create an uninitialized store that will use `len` buckets.
    pub fn with_buckets(log: Logger, len: usize) -> Store {
        assert!(len > 0, "a store needs at least one bucket");

        Store {
            log: log,
            len: len,
            initialized: AtomicBool::new(false),
            buckets: RwLock::new(None),
        }
    }

    /// Initialize the store.
    ///
    /// `flags` must be zero. Fails with `NotPermitted` if the store is already initialized or an
    /// `init`/`destroy` currently owns it.
    pub fn init(&self, flags: u32) -> Result<()> {
        if flags != 0 {
            return Err(Error::InvalidArg);
        }

        // Check before allocating: the array is the expensive part, and if the store is already
        // initialized we can skip it. Racy, which is fine; the authoritative check comes after
        // the lock.
        if self.initialized.load(Ordering::Relaxed) {
            return Err(Error::NotPermitted);
        }

        // Allocate the fresh array outside the critical section.
        let fresh = BucketArray::new(self.len)?;

        // Write side, fail-fast.
        let mut buckets = match self.buckets.try_write() {
            Some(buckets) => buckets,
            // Somebody else is initializing or destroying right now; that's misuse, and the fresh
            // array dies here.
            None => return Err(Error::NotPermitted),
        };
        if buckets.is_some() {
            // Lost the race to another init.
            return Err(Error::NotPermitted);
        }

        // Publish. As soon as the write guard drops, readers may see the array, which is why it
        // was built completely beforehand.
        *buckets = Some(fresh);
        self.initialized.store(true, Ordering::Relaxed);

        info!(self.log, "store initialized"; "buckets" => self.len);
        Ok(())
    }

    /// Destroy the store, freeing every entry.
    ///
    /// Returns the number of entries freed, placeholders included. Fails with `NotPermitted` if
    /// the store is not initialized or an `init`/`destroy` currently owns it.
    pub fn destroy(&self, flags: u32) -> Result<usize> {
        if flags != 0 {
            return Err(Error::InvalidArg);
        }
        if !self.initialized.load(Ordering::Relaxed) {
            return Err(Error::NotPermitted);
        }

        // Write side, fail-fast. Inside the critical section we only unpublish: flip the flag and
        // detach the array to a local.
        let detached = {
            let mut buckets = match self.buckets.try_write() {
                Some(buckets) => buckets,
                None => return Err(Error::NotPermitted),
            };
            let detached = match buckets.take() {
                Some(detached) => detached,
                None => return Err(Error::NotPermitted),
            };
            self.initialized.store(false, Ordering::Relaxed);
            detached
        };

        // Tear the detached array down outside the critical section. This ordering is what lets
        // waiters sleeping on detached entries wake up, re-try the read side, and run their
        // epilogue instead of deadlocking against us.
        let freed = detached.teardown(&self.log);

        info!(self.log, "store destroyed"; "freed" => freed);
        Ok(freed)
    }

    /// Insert or replace the value under a key.
    ///
    /// The previous value, if any, is destroyed. Waiters blocked on the key are woken and one of
    /// them will fetch the new value. `flags` must be zero.
    pub fn put<S: Source + ?Sized>(&self, key: u32, val: &S, flags: u32) -> Result<()> {
        if flags != 0 {
            return Err(Error::InvalidArg);
        }

        // Import the value outside every lock; this is where allocation and the user copy happen.
        let mut pair = Pair::import(key, val)?;

        // Preallocate the entry we might need. We can't know whether the key already has one
        // without taking the bucket lock, and we can't allocate once we hold it, so we always pay
        // for the node and drop it afterwards if the bucket had one.
        let fresh = Arc::new(Entry::new(key));

        {
            // Read side, fail-fast.
            let array = self.enter()?;

            // The bucket critical section: find-or-link, swap, wake. No allocation in here beyond
            // the list push.
            let mut shelf = array.bucket(key).lock();
            let (entry, added) = match shelf.find(key) {
                Some(entry) => (entry, false),
                None => {
                    shelf.add(fresh.clone());
                    (fresh.clone(), true)
                }
            };

            let mut state = entry.lock();
            if added {
                state.linked = true;
            }

            // The swap is the linearization point: the new value goes in, and whatever was there
            // (the old value, or a placeholder's nothing) comes out into our local pair.
            state.pair.swap(&mut pair);
            trace!(self.log, "value stored"; "key" => key, "size" => state.pair.size());

            if state.waiting() > 0 {
                trace!(self.log, "put woke waiters"; "key" => key, "waiters" => state.waiting());
                state.wake_all();
            }
        }

        // Locks are gone. The unused preallocation (if the key already had an entry) and the
        // previous value both die here, outside the critical sections.
        drop(fresh);
        drop(pair);
        Ok(())
    }

    /// Remove and fetch the value under a key.
    ///
    /// On success the value is copied into `dst`, truncated to its capacity, and the entry is gone
    /// from the store. `flags` may contain `BLOCK`, in which case a miss suspends the calling
    /// thread until a put supplies the key, the store is destroyed (`NotPermitted`), or the thread
    /// is interrupted (`Interrupted`). Without `BLOCK` a miss is `NotFound`.
    pub fn get<D: Sink + ?Sized>(&self, key: u32, dst: &mut D, flags: u32) -> Result<()> {
        let flags = GetFlags::from_raw(flags)?;

        if flags.contains(GetFlags::BLOCK) {
            self.get_blocking(key, dst)
        } else {
            self.get_nonblocking(key, dst)
        }
    }

    /// The non-blocking remove-and-fetch.
    fn get_nonblocking<D: Sink + ?Sized>(&self, key: u32, dst: &mut D) -> Result<()> {
        let taken = {
            let array = self.enter()?;
            let mut shelf = array.bucket(key).lock();

            match shelf.find(key) {
                Some(entry) => {
                    let mut state = entry.lock();
                    if state.pair.is_full() {
                        // Remove-or-claim: unlink the entry and walk off with its pair. Nobody
                        // can reach the entry through the bucket anymore.
                        shelf.remove(&entry);
                        state.linked = false;
                        Some(state.pair.take())
                    } else {
                        // A placeholder hosts waiters, not a value; to a non-blocking get the
                        // key is absent.
                        None
                    }
                }
                None => None,
            }
        };

        match taken {
            // Export outside every lock.
            Some(pair) => pair.export(dst),
            None => Err(Error::NotFound),
        }
    }

    /// The blocking remove-and-fetch.
    fn get_blocking<D: Sink + ?Sized>(&self, key: u32, dst: &mut D) -> Result<()> {
        // Preallocate the placeholder we may need to link in, outside every lock.
        let fresh = Arc::new(Entry::new(key));

        let rendezvous = {
            let array = self.enter()?;
            let mut shelf = array.bucket(key).lock();

            match shelf.find(key) {
                Some(entry) => {
                    let mut state = entry.lock();
                    if state.pair.is_full() {
                        // The value is already here; same as the non-blocking hit.
                        shelf.remove(&entry);
                        state.linked = false;
                        let pair = state.pair.take();
                        Rendezvous::Taken(pair)
                    } else {
                        // Somebody else's placeholder; join its roster.
                        state.register();
                        drop(state);
                        Rendezvous::Wait(entry)
                    }
                }
                None => {
                    // Nothing under the key: link our preallocated placeholder and wait on it.
                    shelf.add(fresh.clone());
                    let mut state = fresh.lock();
                    state.linked = true;
                    state.register();
                    drop(state);
                    Rendezvous::Wait(fresh.clone())
                }
            }
        };
        // Locks are gone; if the preallocation went unused, our handle dying here is its free.
        drop(fresh);

        let pair = match rendezvous {
            Rendezvous::Taken(pair) => pair,
            Rendezvous::Wait(target) => self.wait(key, &target)?,
        };

        pair.export(dst)
    }

    /// The wait loop of a blocking get.
    ///
    /// On entry the calling thread is on `target`'s roster. Each round checks, in order: that the
    /// store still admits us, that the placeholder is still linked, that no interruption is
    /// pending, and whether a put has filled the slot; only then does it park. Checking before the
    /// first park matters: the wake (or the interruption) may have landed before we ever sleep,
    /// and park tokens make that window safe.
    fn wait(&self, key: u32, target: &Arc<Entry>) -> Result<Pair> {
        loop {
            // Re-enter the store, fail-fast. Failure means an init/destroy owns the store or the
            // store is down; either way a destroy has detached us or is about to, so run the
            // detached epilogue.
            let array = match self.enter() {
                Ok(array) => array,
                Err(_) => return self.abandon(target),
            };

            let mut shelf = array.bucket(key).lock();
            let mut state = target.lock();

            if !state.linked {
                // Destroyed under us. The table (and the value, if a put managed to land one) is
                // gone; the shelf we just locked belongs to a successor table and never knew our
                // placeholder.
                drop(state);
                drop(shelf);
                drop(array);
                return self.abandon(target);
            }

            if signal::take_pending() {
                trace!(self.log, "blocking get interrupted"; "key" => key);
                finish_wait(&mut shelf, &mut state, target);
                return Err(Error::Interrupted);
            }

            if state.pair.is_full() {
                // A put came through; claim the value.
                let pair = state.pair.take();
                debug_assert_eq!(pair.key(), target.key());
                finish_wait(&mut shelf, &mut state, target);
                return Ok(pair);
            }

            // Not yet. Release everything and go to sleep; parking while holding any of these
            // locks would deadlock the put that is supposed to wake us. Spurious wake-ups just
            // take another lap.
            drop(state);
            drop(shelf);
            drop(array);
            thread::park();
        }
    }

    /// The detached epilogue of a waiter.
    ///
    /// The placeholder is (or is about to be) torn out of the table, so the rendezvous is off:
    /// leave the roster and report `NotPermitted`. The placeholder's storage is freed by whichever
    /// handle drops last.
    fn abandon(&self, target: &Arc<Entry>) -> Result<Pair> {
        let mut state = target.lock();
        state.deregister();
        trace!(self.log, "waiter abandoned detached entry";
               "key" => target.key(), "remaining" => state.waiting());
        drop(state);

        Err(Error::NotPermitted)
    }

    /// Enter the store's read side, fail-fast.
    ///
    /// The pattern is check-before-lock (the relaxed hint, to skip the lock when the answer is
    /// already no), lock (try-only, since a held write side means an `init`/`destroy` owns the
    /// store), check-after-lock (the authoritative one). Every failure is the caller's
    /// `NotPermitted`.
    fn enter(&self) -> Result<MappedRwLockReadGuard<BucketArray>> {
        if !self.initialized.load(Ordering::Relaxed) {
            return Err(Error::NotPermitted);
        }

        let buckets = match self.buckets.try_read() {
            Some(buckets) => buckets,
            None => return Err(Error::NotPermitted),
        };

        RwLockReadGuard::try_map(buckets, |buckets| buckets.as_ref())
            .map_err(|_| Error::NotPermitted)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Destroy in case the user forgot, so entries are freed and any sleeping waiters are woken
        // rather than leaked. An error here just means there was nothing to do.
        let _ = self.destroy(0);
    }
}

/// Finish a wait on the break path, holding the bucket and entry locks.
///
/// Leaves the roster; the last waiter off a placeholder also unlinks it from its bucket. The
/// remove tolerates the placeholder already being gone: a destroy may have torn it out between
/// our wake-up and this lock acquisition, in which case its teardown owns the unlinking.
fn finish_wait(shelf: &mut Shelf, state: &mut EntryState, target: &Arc<Entry>) {
    state.deregister();
    if state.waiting() == 0 && state.linked {
        shelf.remove(target);
        state.linked = false;
    }
}
