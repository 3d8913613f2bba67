//! Operation flags.

use error::{Error, Result};

bitflags! {
    /// Flags accepted by get.
    pub struct GetFlags: u32 {
        /// Block until a value is available under the key.
        const BLOCK = 1;
    }
}

impl GetFlags {
    /// The non-blocking mode: the empty flag set.
    pub const NONBLOCK: GetFlags = GetFlags { bits: 0 };

    /// Validate a raw flag word.
    ///
    /// Any bit outside the documented set is an `InvalidArg`.
    pub fn from_raw(flags: u32) -> Result<GetFlags> {
        GetFlags::from_bits(flags).ok_or(Error::InvalidArg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_words() {
        assert_eq!(GetFlags::from_raw(0), Ok(GetFlags::NONBLOCK));
        assert_eq!(GetFlags::from_raw(1), Ok(GetFlags::BLOCK));
        assert_eq!(GetFlags::from_raw(2), Err(Error::InvalidArg));
        assert_eq!(GetFlags::from_raw(3), Err(Error::InvalidArg));
        assert_eq!(GetFlags::from_raw(!0), Err(Error::InvalidArg));
    }
}
