//! Key-value pairs.

use std::{cmp, mem};

use error::{Error, Result};
use user::{Sink, Source};

/// A key-value pair.
///
/// A pair owns its value buffer outright. It is created from an external byte source, moved
/// (swapped) between entry slots, and destroyed by whoever holds it last.
///
/// The value distinguishes three shapes:
///
/// - `None`: no value at all. This is the placeholder state a blocking get leaves behind while it
///   waits for a put; it is never handed out.
/// - `Some` of the empty slice: a present, zero-length value. The empty boxed slice allocates
///   nothing and is effectively immutable, so this costs as much as the placeholder but means the
///   opposite thing.
/// - `Some` of a non-empty buffer: an ordinary value.
#[derive(Debug)]
pub struct Pair {
    /// The key.
    key: u32,
    /// The value, if one is present.
    val: Option<Box<[u8]>>,
}

impl Pair {
    /// Create a pair with a key and no value.
    pub fn empty(key: u32) -> Pair {
        Pair {
            key: key,
            val: None,
        }
    }

    /// Import a pair from an external byte source.
    ///
    /// This allocates room for the source's bytes and copies them in, both before any lock is
    /// taken. Allocation failure is `OutOfMemory`; a failed copy is `BadAddress`, and the buffer
    /// allocated for it is released on the way out.
    ///
    /// A zero-length source takes the sentinel shape: no allocation, no copy, no way to fail.
    pub fn import<S: Source + ?Sized>(key: u32, src: &S) -> Result<Pair> {
        let size = src.len();
        if size == 0 {
            return Ok(Pair {
                key: key,
                val: Some(Vec::new().into_boxed_slice()),
            });
        }

        // Reserve through the fallible API so running out of memory is an error, not an abort.
        let mut buf = Vec::new();
        buf.try_reserve_exact(size).map_err(|_| Error::OutOfMemory)?;
        buf.resize(size, 0);

        // The copy may fault; `buf` dies here if it does.
        src.copy_to(&mut buf)?;

        Ok(Pair {
            key: key,
            val: Some(buf.into_boxed_slice()),
        })
    }

    /// The key.
    pub fn key(&self) -> u32 {
        self.key
    }

    /// The size of the value in bytes; zero if no value is present.
    pub fn size(&self) -> usize {
        self.val.as_ref().map_or(0, |val| val.len())
    }

    /// Is a value present?
    ///
    /// A zero-length value counts; only the placeholder state does not.
    pub fn is_full(&self) -> bool {
        self.val.is_some()
    }

    /// Export the value to an external byte sink.
    ///
    /// This copies `min(size, capacity)` bytes. Truncation is silent: the caller gets at most what
    /// fits, and no length is reported. A zero-length copy is skipped entirely and thus cannot
    /// fault.
    pub fn export<D: Sink + ?Sized>(&self, dst: &mut D) -> Result<()> {
        let val = match self.val {
            Some(ref val) => val,
            None => return Ok(()),
        };

        let size = cmp::min(val.len(), dst.capacity());
        if size == 0 {
            return Ok(());
        }

        dst.copy_from(&val[..size])
    }

    /// Swap contents with another pair.
    pub fn swap(&mut self, other: &mut Pair) {
        mem::swap(self, other);
    }

    /// Take the pair out, leaving an empty pair with the same key behind.
    pub fn take(&mut self) -> Pair {
        let key = self.key;
        mem::replace(self, Pair::empty(key))
    }

    /// Release the value, if any. Idempotent.
    pub fn free(&mut self) {
        self.val = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::Error;
    use user::{Sink, Source};

    /// A source that always faults.
    struct BadSource(usize);

    impl Source for BadSource {
        fn len(&self) -> usize {
            self.0
        }

        fn copy_to(&self, _dst: &mut [u8]) -> super::Result<()> {
            Err(Error::BadAddress)
        }
    }

    /// A sink that always faults.
    struct BadSink(usize);

    impl Sink for BadSink {
        fn capacity(&self) -> usize {
            self.0
        }

        fn copy_from(&mut self, _src: &[u8]) -> super::Result<()> {
            Err(Error::BadAddress)
        }
    }

    #[test]
    fn import_export() {
        let pair = Pair::import(7, &b"orange"[..]).unwrap();
        assert_eq!(pair.key(), 7);
        assert_eq!(pair.size(), 6);
        assert!(pair.is_full());

        let mut buf = [0; 16];
        pair.export(&mut buf[..]).unwrap();
        assert_eq!(&buf[..6], b"orange");
    }

    #[test]
    fn export_truncates() {
        let pair = Pair::import(7, &b"orange"[..]).unwrap();

        let mut buf = [0; 3];
        pair.export(&mut buf[..]).unwrap();
        assert_eq!(&buf, b"ora");
    }

    #[test]
    fn zero_length_is_full() {
        let pair = Pair::import(7, &b""[..]).unwrap();
        assert_eq!(pair.size(), 0);
        assert!(pair.is_full());

        // The zero-length copy is skipped, so even a faulting sink succeeds.
        pair.export(&mut BadSink(200)).unwrap();
    }

    #[test]
    fn placeholder_is_not_full() {
        let pair = Pair::empty(7);
        assert_eq!(pair.size(), 0);
        assert!(!pair.is_full());
    }

    #[test]
    fn bad_source_faults() {
        assert_eq!(Pair::import(7, &BadSource(6)).unwrap_err(), Error::BadAddress);
        // The zero-length path never reads the source.
        assert!(Pair::import(7, &BadSource(0)).is_ok());
    }

    #[test]
    fn bad_sink_faults() {
        let pair = Pair::import(7, &b"orange"[..]).unwrap();
        assert_eq!(pair.export(&mut BadSink(200)).unwrap_err(), Error::BadAddress);
        // A zero-capacity sink is never written.
        pair.export(&mut BadSink(0)).unwrap();
    }

    #[test]
    fn swap_and_take() {
        let mut a = Pair::import(1, &b"a"[..]).unwrap();
        let mut b = Pair::empty(1);

        a.swap(&mut b);
        assert!(!a.is_full());
        assert!(b.is_full());

        let taken = b.take();
        assert!(taken.is_full());
        assert!(!b.is_full());
        assert_eq!(b.key(), 1);
    }

    #[test]
    fn free_is_idempotent() {
        let mut pair = Pair::import(1, &b"a"[..]).unwrap();
        pair.free();
        assert!(!pair.is_full());
        pair.free();
        assert!(!pair.is_full());
    }
}
