/// Window visibility signal shared between the event wiring and the sound
/// manager.
///
/// The wiring flips the flag when the host window is hidden or shown and
/// calls `pause_all`/`resume_all`; the manager reads the flag to suppress
/// new playback while hidden and to re-check after a platform resume.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct VisibilitySignal {
    hidden: Arc<AtomicBool>,
}

impl VisibilitySignal {
    /// Create a signal in the visible state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the window is currently hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::Acquire)
    }

    /// Record a visibility change.
    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_starts_visible() {
        let signal = VisibilitySignal::new();
        assert!(!signal.is_hidden());
    }

    #[test]
    fn test_visibility_shared_between_clones() {
        let signal = VisibilitySignal::new();
        let other = signal.clone();

        signal.set_hidden(true);
        assert!(other.is_hidden());

        other.set_hidden(false);
        assert!(!signal.is_hidden());
    }
}
