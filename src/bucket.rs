//! Hash table buckets.

use std::mem;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use entry::Entry;

/// A bucket: one lock over a short list of entries.
///
/// Every structural operation on the list (find, add, remove) happens under the lock, and the
/// critical sections are a few pointer moves each. The list is unordered; a linear scan is fine at
/// the handful of entries a bucket ever holds.
pub struct Bucket {
    /// The guarded shelf.
    shelf: Mutex<Shelf>,
}

/// The lock-guarded contents of a bucket.
pub struct Shelf {
    /// The entries on the shelf.
    entries: Vec<Arc<Entry>>,
    /// The number of entries; always equal to the list length.
    count: u32,
}

impl Bucket {
    /// Create an empty bucket.
    pub fn new() -> Bucket {
        Bucket {
            shelf: Mutex::new(Shelf {
                entries: Vec::new(),
                count: 0,
            }),
        }
    }

    /// Lock the shelf.
    pub fn lock(&self) -> MutexGuard<Shelf> {
        self.shelf.lock()
    }

    /// Consume the bucket, yielding the shelf without locking.
    ///
    /// Only table teardown calls this, at which point the detached array is owned outright and
    /// nobody else can reach the bucket.
    pub fn into_shelf(self) -> Shelf {
        self.shelf.into_inner()
    }
}

impl Shelf {
    /// Find the entry under a key.
    pub fn find(&self, key: u32) -> Option<Arc<Entry>> {
        self.entries.iter().find(|entry| entry.key() == key).cloned()
    }

    /// Add an entry to the shelf.
    ///
    /// The caller is responsible for making sure no entry with the same key is already present,
    /// and for marking the entry linked under its own lock.
    pub fn add(&mut self, entry: Arc<Entry>) {
        self.entries.push(entry);
        self.count += 1;
        debug_assert_eq!(self.count as usize, self.entries.len());
    }

    /// Remove an entry from the shelf by node identity.
    ///
    /// Returns whether the entry was present. A woken waiter racing a destroy can try to unlink a
    /// placeholder that has already been torn out of the table; that remove is a no-op here.
    pub fn remove(&mut self, entry: &Arc<Entry>) -> bool {
        match self.entries.iter().position(|other| Arc::ptr_eq(other, entry)) {
            Some(at) => {
                self.entries.swap_remove(at);
                self.count -= 1;
                debug_assert_eq!(self.count as usize, self.entries.len());
                true
            }
            None => false,
        }
    }

    /// The number of entries.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Take every entry off the shelf.
    pub fn drain(&mut self) -> Vec<Arc<Entry>> {
        self.count = 0;
        mem::replace(&mut self.entries, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use entry::Entry;

    #[test]
    fn find_add_remove() {
        let bucket = Bucket::new();
        let mut shelf = bucket.lock();

        assert!(shelf.find(1).is_none());
        assert_eq!(shelf.count(), 0);

        let a = Arc::new(Entry::new(1));
        let b = Arc::new(Entry::new(2));
        shelf.add(a.clone());
        shelf.add(b.clone());
        assert_eq!(shelf.count(), 2);

        assert!(Arc::ptr_eq(&shelf.find(1).unwrap(), &a));
        assert!(Arc::ptr_eq(&shelf.find(2).unwrap(), &b));
        assert!(shelf.find(3).is_none());

        assert!(shelf.remove(&a));
        assert_eq!(shelf.count(), 1);
        assert!(shelf.find(1).is_none());

        // Removing an entry that is no longer on the shelf is a no-op.
        assert!(!shelf.remove(&a));
        assert_eq!(shelf.count(), 1);
    }

    #[test]
    fn drain_empties_the_shelf() {
        let bucket = Bucket::new();
        {
            let mut shelf = bucket.lock();
            shelf.add(Arc::new(Entry::new(1)));
            shelf.add(Arc::new(Entry::new(2)));
        }

        let mut shelf = bucket.into_shelf();
        let drained = shelf.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(shelf.count(), 0);
        assert!(shelf.find(1).is_none());
    }
}
