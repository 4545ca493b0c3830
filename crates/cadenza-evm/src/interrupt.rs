//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a running execution at the next step.
///
/// Clones share the flag, so one clone can be handed to another thread
/// while the engine holds the other.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// New, unset handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();
        assert!(!handle.is_interrupted());
        remote.interrupt();
        assert!(handle.is_interrupted());
        handle.reset();
        assert!(!remote.is_interrupted());
    }

    #[test]
    fn test_interrupt_from_other_thread() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();
        std::thread::spawn(move || remote.interrupt())
            .join()
            .unwrap();
        assert!(handle.is_interrupted());
    }
}
