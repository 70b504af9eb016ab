//! Abort flag plumbing for the engine's cancellation hooks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag consulted by the engine during decoding.
///
/// The decoder polls this frequently through its abort callback. Nothing
/// sets the flag today; a future cancel path flips it and the in-flight
/// inference stops at the next poll.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_shared_across_clones() {
        let flag = AbortFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_set());
        flag.set();
        assert!(observer.is_set());
    }
}
