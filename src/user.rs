//! External byte buffers.
//!
//! Values enter and leave the store through buffers the store does not own, such as userspace
//! memory behind a syscall boundary. The store performs exactly two operations
//! on such buffers: a bounded copy-in on put and a bounded copy-out on get, and either copy may
//! fail. These traits are that contract; marshalling beyond it is the host's problem.
//!
//! Plain byte slices implement both sides infallibly. Tests implement the traits with failing
//! doubles to reach the `BadAddress` paths, which slices cannot produce.

use error::Result;

/// An external byte source, read once by put.
pub trait Source {
    /// The number of bytes the source holds.
    fn len(&self) -> usize;

    /// Copy every byte of the source into `dst`.
    ///
    /// `dst` is exactly `len` bytes. Fails with `BadAddress` if the source cannot be read.
    fn copy_to(&self, dst: &mut [u8]) -> Result<()>;
}

/// An external byte sink, written once by get.
pub trait Sink {
    /// The number of bytes the sink can take.
    fn capacity(&self) -> usize;

    /// Copy `src` into the front of the sink.
    ///
    /// `src` is at most `capacity` bytes. Fails with `BadAddress` if the sink cannot be written.
    fn copy_from(&mut self, src: &[u8]) -> Result<()>;
}

impl Source for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_to(&self, dst: &mut [u8]) -> Result<()> {
        dst.copy_from_slice(self);
        Ok(())
    }
}

impl Sink for [u8] {
    fn capacity(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_from(&mut self, src: &[u8]) -> Result<()> {
        self[..src.len()].copy_from_slice(src);
        Ok(())
    }
}
