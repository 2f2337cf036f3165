//! Thread affinity checks for the host's main thread.
//!
//! A [`RequestEngine`](crate::RequestEngine) records the thread it was built
//! on and treats it as the host's main thread. Callbacks may only run there,
//! and the blocking entry points warn when they are called from it.
//!
//! Two levels of checking are provided:
//!
//! - **Debug assertions** ([`ThreadAffinity::debug_assert_same_thread_with_msg`]):
//!   only active in debug builds.
//! - **Runtime assertions** ([`ThreadAffinity::assert_same_thread_with_msg`]):
//!   always active.

use std::thread::ThreadId;

/// Thread affinity tracker.
///
/// Records the thread on which it was created and verifies that later
/// operations happen on the same thread.
///
/// # Example
///
/// ```
/// use tickline_core::thread_check::ThreadAffinity;
///
/// let affinity = ThreadAffinity::current();
/// assert!(affinity.is_same_thread());
///
/// let other = std::thread::spawn(move || affinity.is_same_thread())
///     .join()
///     .unwrap();
/// assert!(!other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Create a tracker bound to the current thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// Get the thread ID this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Check if the current thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the bound thread, with a custom message.
    ///
    /// # Panics
    ///
    /// Panics if called from a different thread.
    pub fn assert_same_thread_with_msg(&self, msg: &str) {
        if !self.is_same_thread() {
            self.panic_wrong_thread(msg);
        }
    }

    /// Debug-only assertion with a custom message.
    #[inline]
    pub fn debug_assert_same_thread_with_msg(&self, msg: &str) {
        #[cfg(debug_assertions)]
        self.assert_same_thread_with_msg(msg);
        #[cfg(not(debug_assertions))]
        let _ = msg;
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, msg: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            ══════════════════════════════════════════════════════════════════════\n\
            THREAD AFFINITY VIOLATION\n\
            ══════════════════════════════════════════════════════════════════════\n\
            \n\
            {msg}\n\
            \n\
            Engine main thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            Completion callbacks are only delivered from RequestEngine::tick(),\n\
            which must be driven by the host's per-cycle update hook on the\n\
            thread that constructed the engine.\n\
            \n\
            ══════════════════════════════════════════════════════════════════════",
            self.thread_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_affinity_same_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_same_thread());
        affinity.assert_same_thread_with_msg("same thread");
        affinity.debug_assert_same_thread_with_msg("same thread");
    }

    #[test]
    fn test_thread_affinity_different_thread() {
        let affinity = ThreadAffinity::current();
        let on_other = std::thread::spawn(move || affinity.is_same_thread())
            .join()
            .unwrap();
        assert!(!on_other, "is_same_thread() should be false from another thread");
        assert_eq!(ThreadAffinity::default(), affinity);
    }

    #[test]
    fn test_thread_affinity_panic_on_wrong_thread() {
        let affinity = ThreadAffinity::current();

        let result = std::thread::spawn(move || {
            affinity.assert_same_thread_with_msg("tick from a worker");
        })
        .join();

        assert!(result.is_err(), "expected affinity violation panic");
    }
}
