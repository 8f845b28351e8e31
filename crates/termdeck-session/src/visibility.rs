//! Foreground tracking for the consuming UI.

use tracing::debug;

/// Whether the UI is currently on screen.
///
/// Starts hidden; visible exactly between `became_visible` and the next
/// `became_hidden`. Background-origin events only reach the notifier and the
/// surface while this reports visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisibilityGate {
    visible: bool,
}

impl VisibilityGate {
    /// Create a hidden gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the UI as foregrounded. Returns `true` if this changed anything.
    pub fn became_visible(&mut self) -> bool {
        let changed = !self.visible;
        self.visible = true;
        debug!("Visibility: visible (changed={})", changed);
        changed
    }

    /// Mark the UI as backgrounded. Returns `true` if this changed anything.
    pub fn became_hidden(&mut self) -> bool {
        let changed = self.visible;
        self.visible = false;
        debug!("Visibility: hidden (changed={})", changed);
        changed
    }

    /// Current state.
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_transitions() {
        let mut gate = VisibilityGate::new();
        assert!(!gate.is_visible());

        assert!(gate.became_visible());
        assert!(gate.is_visible());
        assert!(!gate.became_visible());

        assert!(gate.became_hidden());
        assert!(!gate.is_visible());
        assert!(!gate.became_hidden());
    }
}
