//! Error handling.
//!
//! Every operation reports failure synchronously through one crate-wide error type. Nothing is
//! swallowed and nothing is translated between layers; the variant a caller sees names the exact
//! condition the operation ran into.

quick_error! {
    /// A store operation error.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Error {
        /// Flag bits outside the documented set were passed.
        InvalidArg {
            display("invalid flags")
        }
        /// An allocation failed.
        OutOfMemory {
            display("out of memory")
        }
        /// A copy to or from an external byte buffer failed.
        BadAddress {
            display("bad address")
        }
        /// The operation was called in a state that violates the init/destroy discipline: the
        /// store is not initialized, or the call raced an `init`/`destroy` that owns the table.
        NotPermitted {
            display("operation not permitted")
        }
        /// A non-blocking get found no value under the key.
        NotFound {
            display("no such entry")
        }
        /// A blocking get was aborted by an interruption.
        Interrupted {
            display("interrupted")
        }
    }
}

/// The result of a store operation.
pub type Result<T> = ::std::result::Result<T, Error>;
