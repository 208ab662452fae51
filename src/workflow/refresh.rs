//! Generation counter for superseding in-flight refreshes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Stamps list refreshes so a response that arrives after a newer refresh
/// was issued can be discarded instead of clobbering the newer view.
///
/// Requests themselves are never cancelled once issued; a caller that
/// ignores the stamp falls back to last-write-wins.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    generation: AtomicU64,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new refresh, superseding all earlier ones. Returns the
    /// stamp to check against when the response arrives.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a response stamped with `generation` should still apply.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_refresh_wins() {
        let guard = RefreshGuard::new();
        let first = guard.begin();
        let second = guard.begin();

        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }

    #[test]
    fn test_single_refresh_is_current() {
        let guard = RefreshGuard::new();
        let only = guard.begin();
        assert!(guard.is_current(only));
    }
}
