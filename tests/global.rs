//! The process-wide default store.
//!
//! One test, because the global store is shared state: everything it needs to prove happens in a
//! single sequential scenario.

extern crate fridge;

use fridge::{global, Error};

#[test]
fn facade_round_trip() {
    // The global store starts uninitialized like any other.
    assert_eq!(global::put(1, &b"early"[..], 0), Err(Error::NotPermitted));

    global::init(0).unwrap();
    assert_eq!(global::init(0), Err(Error::NotPermitted));

    global::put(0xbeef, &b"orange\0"[..], 0).unwrap();

    let mut buf = [0; 200];
    global::get(0xbeef, &mut buf[..], 0).unwrap();
    assert_eq!(&buf[..7], b"orange\0");
    assert_eq!(global::get(0xbeef, &mut buf[..], 0), Err(Error::NotFound));

    assert_eq!(global::destroy(0), Ok(0));
    assert_eq!(global::destroy(0), Err(Error::NotPermitted));
}
