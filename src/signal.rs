//! In-process interruption.
//!
//! A blocking get sleeps in an interruptible state: delivering an interruption to the sleeping
//! thread makes the get abort with `Interrupted`. Against an in-process library there is no kernel
//! to deliver signals, so this module keeps the equivalent bookkeeping: a process-wide set of
//! threads with an interruption pending. `interrupt` marks a thread and wakes it; the blocking-get
//! wait loop consumes the mark.
//!
//! A mark aimed at a thread that is not sleeping in a get stays pending and aborts that thread's
//! next blocking get, the same way a signal sent just before the call would.

use std::collections::HashSet;
use std::thread::{self, Thread, ThreadId};

use parking_lot::Mutex;

lazy_static! {
    /// The threads with an interruption pending.
    static ref PENDING: Mutex<HashSet<ThreadId>> = Mutex::new(HashSet::new());
}

/// Interrupt a thread.
///
/// If `thread` is sleeping in a blocking get, the get returns `Interrupted`; otherwise the
/// interruption stays pending for the thread's next blocking get.
pub fn interrupt(thread: &Thread) {
    PENDING.lock().insert(thread.id());
    thread.unpark();
}

/// Consume the calling thread's pending interruption, if any.
pub(crate) fn take_pending() -> bool {
    PENDING.lock().remove(&thread::current().id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn mark_is_consumed_once() {
        assert!(!take_pending());

        interrupt(&thread::current());
        assert!(take_pending());
        assert!(!take_pending());
    }

    #[test]
    fn marks_are_per_thread() {
        interrupt(&thread::current());

        thread::spawn(|| {
            assert!(!take_pending());
        })
        .join()
        .unwrap();

        assert!(take_pending());
    }
}
